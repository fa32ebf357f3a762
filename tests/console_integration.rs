mod common;

use common::{CallLog, Harness, RecordingMemory, ScriptedAgent};
use hazel::console::{ConsoleSession, ConsoleState};

/// Run a console session over `input` and return the transcript.
async fn run_console(h: &Harness, input: &str) -> String {
    let mut session = ConsoleSession::new(&h.chat, input.as_bytes(), Vec::new());
    session.run().await.unwrap();
    assert_eq!(session.state(), ConsoleState::Terminated);
    String::from_utf8(session.into_writer()).unwrap()
}

#[tokio::test]
async fn test_full_conversation_transcript() {
    let h = Harness::replying("Hey Alex, how are you?");

    let out = run_console(&h, "Alex\nhello\nexit\n").await;

    assert_eq!(
        out,
        "Enter your name to start to chat: \
         \n-------------Starting a new chat----------\n\n\
         Alex: Hazel: Hey Alex, how are you?\n\
         Alex: Hazel: Goodbye Alex! Have a great day!!\n"
    );
}

#[tokio::test]
async fn test_turn_order_search_complete_add() {
    let h = Harness::replying("reply");

    run_console(&h, "Alex\nhello\nbye\n").await;

    assert_eq!(
        h.log.events(),
        vec![
            "search:Alex:hello",
            "complete",
            "add:Alex:Alex: hello",
            "add:Alex:Hazel: hello",
        ]
    );
}

#[tokio::test]
async fn test_console_prompt_has_no_history() {
    let h = Harness::replying("reply");

    run_console(&h, "Alex\nhello\nquit\n").await;

    let prompt = h.prompt(0);
    assert!(prompt.contains("User's name is Alex"));
    assert!(prompt.contains("User's input: hello"));
    assert!(!prompt.contains("Recent chat history:"));
}

#[tokio::test]
async fn test_exit_keywords_make_no_calls() {
    for keyword in ["exit", "QUIT", "Bye"] {
        let h = Harness::replying("unused");
        let out = run_console(&h, &format!("Alex\n{keyword}\nhello\n")).await;

        assert!(out.ends_with("Hazel: Goodbye Alex! Have a great day!!\n"), "{keyword}");
        assert!(h.log.events().is_empty(), "{keyword}");
    }
}

#[tokio::test]
async fn test_end_of_input_says_goodbye() {
    let h = Harness::replying("reply");

    let out = run_console(&h, "Alex\nhello\n").await;

    assert!(out.ends_with("Alex: Hazel: Goodbye Alex! Have a great day!!\n"));
    assert_eq!(h.agent.requests().len(), 1);
}

#[tokio::test]
async fn test_crlf_line_endings() {
    let h = Harness::replying("reply");

    let out = run_console(&h, "Alex\r\nhello\r\nexit\r\n").await;

    assert!(out.contains("Alex: Hazel: reply\n"));
    assert_eq!(h.memory.adds()[0].0, "Alex: hello");
}

#[tokio::test]
async fn test_empty_line_is_an_utterance() {
    let h = Harness::replying("Still there?");

    run_console(&h, "Alex\n\nexit\n").await;

    assert_eq!(h.agent.requests().len(), 1);
    assert!(h.prompt(0).contains("User's input: \n"));
}

#[tokio::test]
async fn test_failed_turn_continues() {
    let log = CallLog::default();
    let h = Harness::new(
        RecordingMemory::new(log.clone()),
        ScriptedAgent::failing(log.clone()),
        log,
    );

    let out = run_console(&h, "Alex\nhello\nagain\nexit\n").await;

    assert!(out.contains("Alex: Hazel: [error] completion request failed"));
    assert!(out.ends_with("Hazel: Goodbye Alex! Have a great day!!\n"));
    // Both turns reached the agent; nothing was written to memory.
    assert_eq!(h.agent.requests().len(), 2);
    assert!(h.memory.adds().is_empty());
}
