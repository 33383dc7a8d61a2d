//! Research agent flow: scripted progress, then one text stream.

mod common;

use chat_protocol::{ClientMessage, Role, StreamEvent};

use agw::{agents::ResearchAgent, catalog::ModelCard};

use common::{
    assert_stream_grammar, drain, finish_chunk, sink_and_receiver, text_chunk, type_tags,
    MockBackend,
};

fn model() -> ModelCard {
    ModelCard {
        id: "openai/gpt-5".to_string(),
        name: "GPT-5".to_string(),
        provider: "OpenAI".to_string(),
        supports_reasoning: true,
    }
}

#[tokio::test(start_paused = true)]
async fn test_research_flow_shape() {
    let backend = MockBackend::new(vec![vec![
        text_chunk("Conclusion: "),
        text_chunk("42."),
        finish_chunk("stop"),
    ]]);
    let (sink, rx) = sink_and_receiver();

    ResearchAgent::new(backend.clone(), model())
        .run(
            vec![ClientMessage::text(Role::User, "research this")],
            sink,
        )
        .await;
    let events = drain(rx).await;

    assert_stream_grammar(&events);
    let tags = type_tags(&events);

    assert_eq!(tags[0], "start");
    assert_eq!(tags[1], "data-start-label");

    // Between 3 and 6 search rounds, then one status step.
    let search_steps: Vec<&StreamEvent> = events
        .iter()
        .filter(|event| match event {
            StreamEvent::Data { suffix, data } => {
                suffix == "step" && data["type"] == "search"
            }
            _ => false,
        })
        .collect();
    assert!(
        (3..=6).contains(&search_steps.len()),
        "expected 3-6 search rounds, got {}",
        search_steps.len()
    );
    for step in &search_steps {
        let StreamEvent::Data { data, .. } = step else {
            unreachable!()
        };
        let details = data["details"].as_array().unwrap();
        assert!((2..=8).contains(&details.len()));
        assert!(details
            .iter()
            .all(|host| host.as_str().unwrap().starts_with("www.")));
        assert!(data["label"].as_str().is_some_and(|label| !label.is_empty()));
    }

    let status_steps: Vec<&StreamEvent> = events
        .iter()
        .filter(|event| match event {
            StreamEvent::Data { suffix, data } => suffix == "step" && data["type"] == "status",
            _ => false,
        })
        .collect();
    assert_eq!(status_steps.len(), 1);

    // status step comes after every search step, then the end label.
    let status_pos = tags.len()
        - 1
        - tags
            .iter()
            .rev()
            .position(|tag| tag == "data-step")
            .unwrap();
    assert_eq!(tags[status_pos + 1], "data-end-label");

    // Then the text stream and the terminal finish.
    let tail: Vec<&str> = tags[status_pos + 2..].iter().map(String::as_str).collect();
    assert_eq!(
        tail,
        vec!["text-start", "text-delta", "text-delta", "text-end", "finish"]
    );

    // No tools and no reasoning hint on the provider call.
    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].tools.is_none());
    assert!(requests[0].reasoning_effort.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_research_end_label_text() {
    let backend = MockBackend::new(vec![vec![text_chunk("done"), finish_chunk("stop")]]);
    let (sink, rx) = sink_and_receiver();

    ResearchAgent::new(backend, model())
        .run(vec![ClientMessage::text(Role::User, "go")], sink)
        .await;
    let events = drain(rx).await;

    assert!(events.iter().any(|event| matches!(
        event,
        StreamEvent::Data { suffix, data }
            if suffix == "end-label"
                && data["label"] == "Research completed. Here is my conclusion:"
    )));
    assert!(events.iter().any(|event| matches!(
        event,
        StreamEvent::Data { suffix, data }
            if suffix == "start-label" && data["label"] == "Researching..."
    )));
}
