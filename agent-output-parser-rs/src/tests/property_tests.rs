//! End-to-end behaviour of extraction followed by classification
//!
//! These tests pin down the tie-breaking rules (first action for tool calls,
//! last record for final answers) and the recovery guarantees of the
//! extractor.

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use test_case::test_case;

    use crate::extractor::normalize_literals;
    use crate::{
        classify, extract, AgentOutputParser, ActionInput, CandidateRecord, FailureKind,
        JsonAgentOutputParser, ParseOutcome,
    };

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn run(text: &str) -> crate::ParseResult<ParseOutcome> {
        classify(extract(text), text)
    }

    #[test]
    fn test_single_tool_object() {
        init_logging();
        let text = r#"I will use a tool.
{"action": "weather", "action_input": {"city": "Oslo", "units": "metric"}}"#;

        match run(text).unwrap() {
            ParseOutcome::ToolInvocation {
                action,
                action_input,
                raw_text,
            } => {
                assert_eq!(action, "weather");
                assert_eq!(
                    action_input.into_value(),
                    json!({"city": "Oslo", "units": "metric"})
                );
                assert_eq!(raw_text, text);
            }
            other => panic!("Expected tool invocation, got {:?}", other),
        }
    }

    #[test]
    fn test_single_final_answer_object() {
        let text = r#"{"action": "Final Answer", "action_input": "4"}"#;
        match run(text).unwrap() {
            ParseOutcome::FinalAnswer { payload, raw_text } => {
                assert_eq!(payload, vec![CandidateRecord::new("Final Answer", "4")]);
                assert_eq!(raw_text, text);
            }
            other => panic!("Expected final answer, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_then_final_answer_is_final() {
        init_logging();
        let text = r#"
Action:
{"action": "search", "action_input": "2+2"}
Observation: 4
{"action": "Final Answer", "action_input": "The answer is 4"}
"#;
        match run(text).unwrap() {
            ParseOutcome::FinalAnswer { payload, .. } => {
                assert_eq!(payload.len(), 2);
                assert_eq!(payload[0].action, "search");
                assert_eq!(payload[1].action, "Final Answer");
            }
            other => panic!("Expected final answer, got {:?}", other),
        }
    }

    #[test]
    fn test_two_tool_objects_use_first() {
        let text = r#"{"action": "search", "action_input": "first"}
{"action": "calculator", "action_input": "second"}"#;
        let outcome = run(text).unwrap();
        assert_eq!(
            outcome,
            ParseOutcome::ToolInvocation {
                action: "search".to_string(),
                action_input: ActionInput::from("first"),
                raw_text: text.to_string(),
            }
        );
    }

    #[test_case(json!("plain string") ; "string input")]
    #[test_case(json!({}) ; "empty object")]
    #[test_case(json!({"q": "rust", "n": 3, "flags": [true, false], "nested": {"deep": {"x": null}}}) ; "nested object")]
    #[test_case(json!({"code": "fn main() { println!(\"{}\", 1); }"}) ; "braces inside strings")]
    #[test_case(json!("line one\nline \"two\"") ; "escaped string")]
    fn test_round_trip_in_prose(input: Value) {
        let object = json!({"action": "tool_x", "action_input": input});
        let text = format!(
            "Thought: let me call a tool.\n{}\nThat should do it.",
            serde_json::to_string(&object).unwrap()
        );

        let records = extract(&text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, "tool_x");
        assert_eq!(records[0].action_input.clone().into_value(), input);
        assert!(records[0].extra.is_empty());
    }

    #[test]
    fn test_pretty_printed_round_trip() {
        let object = json!({
            "action": "create_ticket",
            "action_input": {"title": "Broken build", "labels": ["ci", "urgent"], "meta": {"priority": 1}}
        });
        let text = format!("Sure:\n{}\n", serde_json::to_string_pretty(&object).unwrap());
        let records = extract(&text);
        assert_eq!(records.len(), 1);
        assert_eq!(serde_json::to_value(&records[0]).unwrap(), object);
    }

    #[test_case("" ; "empty text")]
    #[test_case("no json here" ; "plain prose")]
    #[test_case(r#"{"name": "search", "args": "x"}"# ; "wrong shape")]
    #[test_case(r#"{"action": "search", "action_input": {"a": 1"# ; "truncated object")]
    fn test_garbage_yields_failure(text: &str) {
        assert!(extract(text).is_empty());
        let err = run(text).unwrap_err();
        assert_eq!(err.kind(), FailureKind::NoCandidates);
        assert_eq!(err.raw_text(), text);
    }

    #[test]
    fn test_missing_action_input_defaults() {
        let records = extract(r#"Calling {"action": "list_files"} now"#);
        assert_eq!(records.len(), 1);
        assert!(records[0].action_input.is_empty_mapping());

        match run(r#"{"action": "list_files"}"#).unwrap() {
            ParseOutcome::ToolInvocation { action_input, .. } => {
                assert_eq!(action_input, ActionInput::default())
            }
            other => panic!("Expected tool invocation, got {:?}", other),
        }
    }

    #[test]
    fn test_python_booleans_are_accepted() {
        let text = r#"{"action": "set_flags", "action_input": {"dry_run": True, "force": False}}"#;
        match run(text).unwrap() {
            ParseOutcome::ToolInvocation { action_input, .. } => {
                assert_eq!(
                    action_input.into_value(),
                    json!({"dry_run": true, "force": false})
                );
            }
            other => panic!("Expected tool invocation, got {:?}", other),
        }
    }

    #[test]
    fn test_normalization_idempotence_and_word_boundaries() {
        let text = r#"{"action": "x", "action_input": {"a": True, "b": Truest, "c": "Falsehood", "d": False}}"#;
        let once = normalize_literals(text).normalized;
        let twice = normalize_literals(&once).normalized;
        assert_eq!(once, twice);
        assert!(once.contains("Truest"));
        assert!(once.contains("Falsehood"));
        assert!(once.contains(r#""a": true"#));
        assert!(once.contains(r#""d": false"#));
    }

    #[test]
    fn test_bad_candidate_between_good_ones() {
        let text = r#"{"action": "a", "action_input": "1"}
{"action": "b", "action_input": {"oops": undefined}}
{"action": "Final Answer", "action_input": "done"}"#;
        match run(text).unwrap() {
            ParseOutcome::FinalAnswer { payload, .. } => {
                let actions: Vec<&str> = payload.iter().map(|r| r.action.as_str()).collect();
                assert_eq!(actions, vec!["a", "Final Answer"]);
            }
            other => panic!("Expected final answer, got {:?}", other),
        }
    }

    #[test]
    fn test_fenced_and_unfenced_agree() {
        let body = r#"{"action": "search", "action_input": {"q": "rust"}}"#;
        let fenced = format!("```json\n{}\n```", body);
        let parser = JsonAgentOutputParser::default();

        let plain = parser.parse(body).unwrap();
        let wrapped = parser.parse(&fenced).unwrap();
        assert_eq!(plain.action(), wrapped.action());
        match (plain, wrapped) {
            (
                ParseOutcome::ToolInvocation { action_input: a, .. },
                ParseOutcome::ToolInvocation { action_input: b, .. },
            ) => assert_eq!(a, b),
            other => panic!("Expected two tool invocations, got {:?}", other),
        }
    }

    #[test]
    fn test_fenced_multiline_final_answer() {
        init_logging();
        let text = "```json\n{\n  \"action\": \"Final Answer\",\n  \"action_input\": \"Line one\nLine two\n\tindented\"\n}\n```";
        let outcome = crate::parse(text).unwrap();

        match outcome {
            ParseOutcome::FinalAnswer { payload, raw_text } => {
                assert_eq!(payload.len(), 1);
                assert_eq!(
                    payload[0].action_input,
                    ActionInput::from("Line one\nLine two\n\tindented")
                );
                assert_eq!(raw_text, text);
            }
            other => panic!("Expected final answer, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_keys_do_not_drop_the_candidate() {
        let text = r#"{"action": "search", "action_input": "q", "thought": "t"}"#;
        let records = extract(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].extra["thought"], json!("t"));

        let outcome = run(text).unwrap();
        assert_eq!(outcome.action(), Some("search"));
    }

    #[test]
    fn test_parser_is_shareable_across_threads() {
        let parser = std::sync::Arc::new(JsonAgentOutputParser::default());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let parser = parser.clone();
                std::thread::spawn(move || {
                    let text = format!(r#"{{"action": "tool_{}", "action_input": "x"}}"#, i);
                    parser.parse(&text).map(|o| o.action().map(str::to_string))
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let action = handle.join().unwrap().unwrap();
            assert_eq!(action, Some(format!("tool_{}", i)));
        }
    }
}
