//! Server-rendered HTML views.

use axum::http::StatusCode;
use std::fmt::Write;
use tictactoe_core::{Game, GameStatus, Position, Square};

const STYLESHEET: &str = "/css/site.css";

/// Escapes text for use in HTML content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wraps a page body in the shared layout. `title` must already be escaped.
fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title} - Tic-Tac-Toe</title>\n\
         <link rel=\"stylesheet\" href=\"{STYLESHEET}\">\n\
         </head>\n\
         <body>\n\
         <header><a class=\"brand\" href=\"/\">Tic-Tac-Toe</a></header>\n\
         <main>\n{body}</main>\n\
         </body>\n\
         </html>\n"
    )
}

/// Line describing whose turn it is or how the game ended.
pub fn status_line(game: &Game) -> String {
    match game.status() {
        GameStatus::InProgress => {
            format!("It's {}'s turn ({})", game.turn(), game.turn().mark())
        }
        GameStatus::Won(player) => format!("{} wins!", player),
        GameStatus::Draw => "It's a draw.".to_string(),
    }
}

/// The game page: status, board and a link to start over.
///
/// Empty cells link to the move action while the game is in progress.
pub fn index(game: &Game, notice: Option<&str>) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<h1 class=\"status\">{}</h1>", escape(&status_line(game)));

    if let Some(notice) = notice {
        let _ = writeln!(body, "<p class=\"notice\" role=\"alert\">{}</p>", escape(notice));
    }

    let playable = !game.status().is_over();
    body.push_str("<table class=\"board\">\n");
    for row in Position::ALL.chunks(3) {
        body.push_str("<tr>");
        for pos in row {
            match game.board().get(*pos) {
                Square::Occupied(player) => {
                    let mark = player.mark();
                    let _ = write!(
                        body,
                        "<td class=\"cell {}\">{}</td>",
                        mark.to_ascii_lowercase(),
                        mark
                    );
                }
                Square::Empty if playable => {
                    let _ = write!(
                        body,
                        "<td class=\"cell\"><a href=\"/Game/Move/{}\" aria-label=\"{}\">&nbsp;</a></td>",
                        pos.to_index(),
                        pos.label()
                    );
                }
                Square::Empty => body.push_str("<td class=\"cell\"></td>"),
            }
        }
        body.push_str("</tr>\n");
    }
    body.push_str("</table>\n");
    body.push_str("<p><a class=\"reset\" href=\"/Game/Reset\">New game</a></p>\n");

    layout("Game", &body)
}

/// The generic error page. `detail` is shown only when given.
pub fn error(detail: Option<&str>) -> String {
    let mut body = String::from(
        "<h1 class=\"text-danger\">Error.</h1>\n\
         <h2 class=\"text-danger\">An error occurred while processing your request.</h2>\n",
    );
    if let Some(detail) = detail {
        let _ = writeln!(body, "<pre class=\"detail\">{}</pre>", escape(detail));
    }
    body.push_str("<p><a href=\"/\">Back to the game</a></p>\n");
    layout("Error", &body)
}

/// Page for client errors such as unknown paths or bad cell numbers.
pub fn problem(status: StatusCode, message: &str) -> String {
    let title = escape(status.canonical_reason().unwrap_or("Error"));
    let body = format!(
        "<h1>{} {}</h1>\n<p>{}</p>\n<p><a href=\"/\">Back to the game</a></p>\n",
        status.as_u16(),
        title,
        escape(message)
    );
    layout(&title, &body)
}
