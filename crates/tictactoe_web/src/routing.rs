//! Conventional routing: URL patterns such as
//! `{controller=Game}/{action=Index}/{id?}` mapped to controller actions.

use axum::http::Method;
use percent_encoding::percent_decode_str;
use std::collections::BTreeMap;
use tracing::{debug, instrument, trace};

/// Name of the route every application gets.
pub const DEFAULT_ROUTE_NAME: &str = "default";

/// Pattern of the default route.
pub const DEFAULT_ROUTE_PATTERN: &str = "{controller=Game}/{action=Index}/{id?}";

/// Problem found while parsing a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum RouteError {
    /// `{}` or `{=x}` with no name.
    #[display("Route parameter without a name in {:?}", _0)]
    EmptyParameterName(#[error(not(source))] String),

    /// A brace that is not part of a whole `{...}` segment.
    #[display("Unbalanced braces in segment {:?}", _0)]
    UnbalancedBraces(#[error(not(source))] String),

    /// Two parameters share a name.
    #[display("Route parameter {:?} appears more than once", _0)]
    DuplicateParameter(#[error(not(source))] String),

    /// `a//b`.
    #[display("Empty segment in route pattern")]
    EmptySegment,

    /// A segment that must be present follows one that may be left out.
    #[display("Segment {:?} must come before optional or defaulted segments", _0)]
    RequiredAfterOptional(#[error(not(source))] String),
}

/// One `/`-separated piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text that must appear as is (compared ignoring ASCII case).
    Literal(String),
    /// A captured value.
    Parameter {
        /// Route value name.
        name: String,
        /// Value used when the segment is absent.
        default: Option<String>,
        /// Whether the segment may be absent without a default.
        optional: bool,
    },
}

impl Segment {
    fn may_be_absent(&self) -> bool {
        match self {
            Segment::Literal(_) => false,
            Segment::Parameter {
                default, optional, ..
            } => default.is_some() || *optional,
        }
    }

    fn parse(raw: &str) -> Result<Self, RouteError> {
        if raw.is_empty() {
            return Err(RouteError::EmptySegment);
        }

        let inner = match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(inner) => inner,
            None if raw.contains(['{', '}']) => {
                return Err(RouteError::UnbalancedBraces(raw.to_string()));
            }
            None => return Ok(Segment::Literal(raw.to_string())),
        };
        if inner.contains(['{', '}']) {
            return Err(RouteError::UnbalancedBraces(raw.to_string()));
        }

        let (name, default, optional) = if let Some(name) = inner.strip_suffix('?') {
            (name, None, true)
        } else if let Some((name, default)) = inner.split_once('=') {
            (name, Some(default.to_string()), false)
        } else {
            (inner, None, false)
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(RouteError::EmptyParameterName(raw.to_string()));
        }

        Ok(Segment::Parameter {
            name: name.to_string(),
            default,
            optional,
        })
    }
}

/// Values captured from a matched path, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteValues {
    values: BTreeMap<String, String>,
}

impl RouteValues {
    /// Value of a named parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// The `controller` value.
    pub fn controller(&self) -> Option<&str> {
        self.get("controller")
    }

    /// The `action` value.
    pub fn action(&self) -> Option<&str> {
        self.get("action")
    }

    /// The `id` value.
    pub fn id(&self) -> Option<&str> {
        self.get("id")
    }
}

/// A parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parses a pattern such as `{controller=Game}/{action=Index}/{id?}`.
    #[instrument]
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let trimmed = pattern.trim_matches('/');
        let mut segments = Vec::new();
        let mut names: Vec<String> = Vec::new();

        if !trimmed.is_empty() {
            for raw in trimmed.split('/') {
                let segment = Segment::parse(raw)?;
                if let Segment::Parameter { name, .. } = &segment {
                    if names.contains(name) {
                        return Err(RouteError::DuplicateParameter(name.clone()));
                    }
                    names.push(name.clone());
                }
                let after_optional = segments.last().is_some_and(Segment::may_be_absent);
                if after_optional && !segment.may_be_absent() {
                    return Err(RouteError::RequiredAfterOptional(raw.to_string()));
                }
                segments.push(segment);
            }
        }

        Ok(Self { segments })
    }

    /// The parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Matches a request path, filling in defaults for absent segments.
    ///
    /// Segments are percent-decoded before matching. A segment that does not
    /// decode to UTF-8 fails the match.
    pub fn resolve(&self, path: &str) -> Option<RouteValues> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let parts: Vec<String> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed
                .split('/')
                .map(|part| {
                    percent_decode_str(part)
                        .decode_utf8()
                        .ok()
                        .map(|decoded| decoded.into_owned())
                })
                .collect::<Option<_>>()?
        };

        if parts.len() > self.segments.len() || parts.iter().any(|p| p.is_empty()) {
            return None;
        }

        let mut values = RouteValues::default();
        for (i, segment) in self.segments.iter().enumerate() {
            match (segment, parts.get(i)) {
                (Segment::Literal(text), Some(part)) => {
                    if !text.eq_ignore_ascii_case(part) {
                        return None;
                    }
                }
                (Segment::Literal(_), None) => return None,
                (Segment::Parameter { name, .. }, Some(part)) => {
                    values.values.insert(name.clone(), part.clone());
                }
                (
                    Segment::Parameter {
                        name,
                        default,
                        optional,
                    },
                    None,
                ) => match default {
                    Some(default) => {
                        values.values.insert(name.clone(), default.clone());
                    }
                    None if *optional => {}
                    None => return None,
                },
            }
        }

        trace!(path, ?values, "Route matched");
        Some(values)
    }
}

/// A named pattern in the route table.
#[derive(Debug, Clone)]
pub struct NamedRoute {
    /// Route name.
    pub name: String,
    /// Parsed pattern.
    pub pattern: RoutePattern,
}

/// Ordered set of routes; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<NamedRoute>,
}

impl RouteTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding only the conventional default route.
    pub fn conventional() -> Result<Self, RouteError> {
        let mut table = Self::new();
        table.map_controller_route(DEFAULT_ROUTE_NAME, DEFAULT_ROUTE_PATTERN)?;
        Ok(table)
    }

    /// Adds a route after the existing ones.
    #[instrument(skip(self))]
    pub fn map_controller_route(
        &mut self,
        name: &str,
        pattern: &str,
    ) -> Result<&mut Self, RouteError> {
        let pattern = RoutePattern::parse(pattern)?;
        debug!(name, "Mapped controller route");
        self.routes.push(NamedRoute {
            name: name.to_string(),
            pattern,
        });
        Ok(self)
    }

    /// Routes in match order.
    pub fn routes(&self) -> &[NamedRoute] {
        &self.routes
    }

    /// Resolves a path against each route in order.
    pub fn resolve(&self, path: &str) -> Option<(&str, RouteValues)> {
        self.routes.iter().find_map(|route| {
            route
                .pattern
                .resolve(path)
                .map(|values| (route.name.as_str(), values))
        })
    }
}

/// Actions of the Game controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Action {
    /// Show the board.
    Index,
    /// Place a mark on cell `id`.
    Move,
    /// Start a new game.
    Reset,
    /// Generic error page.
    Error,
}

/// Name of the only controller.
pub const GAME_CONTROLLER: &str = "Game";

/// A resolved controller action. [`Endpoint::allows`] says which methods
/// it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Action to run.
    pub action: Action,
}

impl Endpoint {
    /// Finds the endpoint for a set of route values.
    pub fn lookup(values: &RouteValues) -> Option<Self> {
        let controller = values.controller()?;
        if !controller.eq_ignore_ascii_case(GAME_CONTROLLER) {
            return None;
        }
        let action = values.action()?.parse::<Action>().ok()?;
        Some(Self { action })
    }

    /// Whether the endpoint accepts `method`.
    pub fn allows(&self, method: &Method) -> bool {
        match self.action {
            Action::Index => method == Method::GET || method == Method::HEAD,
            Action::Move | Action::Reset => method == Method::GET || method == Method::POST,
            Action::Error => true,
        }
    }
}
