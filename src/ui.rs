//! Server-rendered HTML for the GUI.
//!
//! The page works with plain form posts: `/start` binds the name, `/chat`
//! sends a message, and every response re-renders the whole page.

use std::fmt::Write as _;

use crate::session::ChatTurn;

/// Escape text for use in HTML element content and quoted attributes.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

/// Generate the HTML shell for the application.
#[must_use]
pub fn html_shell(assistant_name: &str, content: &str) -> String {
    let name = escape_html(assistant_name);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="{name}, your AI friend">
    <title>{name} - AI Friend</title>
    <style>
        body {{ font-family: system-ui, sans-serif; margin: 0; background: #f6f5f3; color: #1f1f1f; }}
        main {{ max-width: 48rem; margin: 0 auto; padding: 1.5rem; }}
        h1 {{ font-size: 1.4rem; }}
        .card {{ background: #fff; border-radius: 1rem; padding: 1.25rem; box-shadow: 0 1px 4px rgba(0,0,0,.08); }}
        #chat-panel {{ height: 60vh; overflow-y: auto; display: flex; flex-direction: column; gap: .5rem; }}
        .turn {{ padding: .6rem .9rem; border-radius: .8rem; max-width: 80%; white-space: pre-wrap; }}
        .turn.user {{ align-self: flex-end; background: #dbeafe; }}
        .turn.assistant {{ align-self: flex-start; background: #ede9fe; }}
        .speaker {{ font-weight: 600; font-size: .8rem; display: block; }}
        form {{ display: flex; gap: .5rem; margin-top: 1rem; }}
        input[type=text] {{ flex: 1; padding: .7rem; border-radius: .6rem; border: 1px solid #ccc; }}
        button {{ padding: .7rem 1.2rem; border: 0; border-radius: .6rem; background: #7c3aed; color: #fff; }}
        .error {{ background: #fee2e2; color: #991b1b; padding: .6rem .9rem; border-radius: .6rem; margin-bottom: 1rem; }}
    </style>
</head>
<body>
    <main id="app">
        {content}
    </main>
</body>
</html>"#
    )
}

/// Name entry screen.
#[must_use]
pub fn start_screen(assistant_name: &str) -> String {
    let name = escape_html(assistant_name);
    format!(
        r#"<section id="start-screen" class="card">
            <h1>Chat with {name}</h1>
            <form method="post" action="/start">
                <input type="text" name="name" placeholder="Enter your name to start to chat" autofocus>
                <button type="submit">Start chat</button>
            </form>
        </section>"#
    )
}

/// Chat panel with message box.
#[must_use]
pub fn chat_screen(
    assistant_name: &str,
    user_id: &str,
    history: &[ChatTurn],
    error: Option<&str>,
) -> String {
    let mut turns = String::new();
    for turn in history {
        let class = if turn.speaker == assistant_name && turn.speaker != user_id {
            "assistant"
        } else {
            "user"
        };
        let _ = write!(
            turns,
            r#"<div class="turn {class}"><span class="speaker">{}</span>{}</div>"#,
            escape_html(&turn.speaker),
            escape_html(&turn.text)
        );
    }

    let banner = error
        .map(|e| format!(r#"<div class="error" role="alert">{}</div>"#, escape_html(e)))
        .unwrap_or_default();

    format!(
        r#"<section id="chat-screen" class="card">
            <h1>{name} and {user}</h1>
            {banner}
            <div id="chat-panel">{turns}</div>
            <form method="post" action="/chat">
                <input type="text" name="message" placeholder="Type your message..." autocomplete="off" autofocus>
                <button type="submit">Send</button>
            </form>
        </section>
        <script>
            const panel = document.getElementById("chat-panel");
            panel.scrollTop = panel.scrollHeight;
        </script>"#,
        name = escape_html(assistant_name),
        user = escape_html(user_id),
    )
}
