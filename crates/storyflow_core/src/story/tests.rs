//! Story System Integration Tests

#[cfg(test)]
mod story_integration_tests {
    use crate::config::TraversalLimits;
    use crate::error::{ReferenceSource, ValidationError};
    use crate::logic::*;
    use crate::story::*;

    /// Play-pause demo: the viewer loops on the quiz part until they answer
    /// question1="1" and question2="YES".
    fn play_pause_story() -> StoryGraph {
        let parts = vec![
            Part::new("intro", "demo").initial().with_next("play-pause"),
            Part::new("play-pause", "demo")
                .with_foreground(Scene::Quiz { definition: serde_json::Value::Null })
                .with_decision_table("play-pause-quiz"),
            Part::new("countdown", "demo").with_next("finale"),
            Part::new("finale", "demo").final_part(),
        ];
        let table = DecisionTable::new(
            "play-pause-quiz",
            HitPolicy::First,
            vec![Rule::new(
                "rule1",
                1,
                "Ready to start",
                vec![RuleInput::new("question1", "1"), RuleInput::new("question2", "YES")],
                "countdown",
            )
            .unwrap()],
            Some("play-pause".to_string()),
        );
        StoryGraph::build(parts, vec![table]).unwrap()
    }

    fn ready() -> AnswerSet {
        AnswerSet::new().with("question1", "1").with("question2", "YES")
    }

    fn not_ready() -> AnswerSet {
        AnswerSet::new().with("question1", "0").with("question2", "YES")
    }

    #[test]
    fn test_golden_play_pause_evaluation() {
        let graph = play_pause_story();
        let table = graph.decision_table("play-pause-quiz").unwrap();

        let hit = evaluate(table, &ready());
        assert_eq!(hit.next_part_id.as_deref(), Some("countdown"));
        assert_eq!(hit.matched_rule_id.as_deref(), Some("rule1"));

        let miss = evaluate(table, &not_ready());
        assert_eq!(miss.next_part_id.as_deref(), Some("play-pause"));
        assert_eq!(miss.matched_rule_id, None);
    }

    #[test]
    fn test_golden_play_pause_self_loop() {
        let graph = play_pause_story();
        let step = graph.resolve_next("play-pause", Some(&not_ready())).unwrap();
        assert_eq!(step.reason, StepReason::DecisionDefault);
        assert_eq!(step.next_part_id.as_deref(), Some("play-pause"));
    }

    #[test]
    fn test_golden_full_sequence() {
        let graph = play_pause_story();
        let mut attempts = vec![not_ready(), not_ready(), ready()].into_iter();
        let mut source = |_: &Part| attempts.next();

        let playthrough =
            graph.resolve_sequence(&mut source, &TraversalLimits::default()).unwrap();
        assert_eq!(
            playthrough.part_ids,
            vec!["intro", "play-pause", "play-pause", "play-pause", "countdown", "finale"]
        );
        assert_eq!(playthrough.end, PlaythroughEnd::Terminal);

        let reasons: Vec<StepReason> = playthrough.steps.iter().map(|s| s.reason).collect();
        assert_eq!(
            reasons,
            vec![
                StepReason::Linear,
                StepReason::DecisionDefault,
                StepReason::DecisionDefault,
                StepReason::DecisionMatch,
                StepReason::Linear,
                StepReason::Terminal,
            ]
        );
    }

    #[test]
    fn test_rule_order_respected() {
        let table = DecisionTable::new(
            "t",
            HitPolicy::First,
            vec![
                Rule::new("r2", 2, "second", vec![RuleInput::new("q", "a")], "p2").unwrap(),
                Rule::new("r1", 1, "first", vec![RuleInput::new("q", "a")], "p1").unwrap(),
            ],
            None,
        );
        let result = evaluate(&table, &AnswerSet::new().with("q", "a"));
        assert_eq!(result.next_part_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_rule_is_a_conjunction() {
        let rule = Rule::new(
            "r",
            1,
            "both",
            vec![RuleInput::new("q1", "a"), RuleInput::new("q2", "b")],
            "p",
        )
        .unwrap();
        assert!(!rule.matches(&AnswerSet::new().with("q1", "a")));
        assert!(rule.matches(&AnswerSet::new().with("q1", "a").with("q2", "b")));
    }

    #[test]
    fn test_no_match_without_defaults_is_terminal() {
        let graph = StoryGraph::build(
            vec![Part::new("quiz", "s").initial().with_decision_table("t")],
            vec![DecisionTable::new(
                "t",
                HitPolicy::First,
                vec![Rule::new("r", 1, "r", vec![RuleInput::new("q", "a")], "quiz").unwrap()],
                None,
            )],
        )
        .unwrap();

        let table = graph.decision_table("t").unwrap();
        assert_eq!(evaluate(table, &AnswerSet::new()).next_part_id, None);

        let step = graph.resolve_next("quiz", Some(&AnswerSet::new())).unwrap();
        assert_eq!(step.reason, StepReason::Terminal);
        assert_eq!(step.next_part_id, None);
    }

    #[test]
    fn test_dangling_rule_target_names_rule() {
        let errors = StoryGraph::build(
            vec![Part::new("quiz", "s").initial().with_decision_table("t")],
            vec![DecisionTable::new(
                "t",
                HitPolicy::First,
                vec![Rule::new("r7", 1, "r7", vec![RuleInput::new("q", "a")], "ghost").unwrap()],
                None,
            )],
        )
        .unwrap_err();

        assert_eq!(
            errors,
            vec![ValidationError::DanglingReference {
                origin: ReferenceSource::Rule { table_id: "t".to_string(), rule_id: "r7".to_string() },
                target: "ghost".to_string(),
            }]
        );
    }

    #[test]
    fn test_exactly_one_initial_part() {
        let none = StoryGraph::build(vec![Part::new("a", "s"), Part::new("b", "s")], vec![]);
        assert_eq!(none.unwrap_err(), vec![ValidationError::MissingInitialPart]);

        let two =
            StoryGraph::build(vec![Part::new("a", "s").initial(), Part::new("b", "s").initial()], vec![]);
        assert_eq!(
            two.unwrap_err(),
            vec![ValidationError::MultipleInitialParts {
                part_ids: vec!["a".to_string(), "b".to_string()]
            }]
        );
    }

    #[test]
    fn test_cycles_build_and_alternate() {
        let graph = StoryGraph::build(
            vec![Part::new("a", "s").initial().with_next("b"), Part::new("b", "s").with_next("a")],
            vec![],
        )
        .unwrap();

        let mut current = "a".to_string();
        for i in 0..1000 {
            let step = graph.resolve_next(&current, None).unwrap();
            assert_eq!(step.reason, StepReason::Linear);
            current = step.next_part_id.unwrap();
            assert_eq!(current, if i % 2 == 0 { "b" } else { "a" });
        }
    }

    #[test]
    fn test_unreachable_parts_reported() {
        let graph = play_pause_story();
        assert!(graph.unreachable_part_ids().is_empty());
        assert_eq!(graph.reachable_part_ids().len(), 4);
    }
}

#[cfg(test)]
mod story_property_tests {
    use crate::logic::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn answer_value_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(json!("0")),
            Just(json!("1")),
            Just(json!(1)),
            Just(json!("YES")),
            Just(json!("NO")),
            Just(json!(true)),
        ]
    }

    fn answers_strategy() -> impl Strategy<Value = AnswerSet> {
        (prop::option::of(answer_value_strategy()), prop::option::of(answer_value_strategy()))
            .prop_map(|(q1, q2)| {
                let mut answers = AnswerSet::new();
                if let Some(value) = q1 {
                    answers.insert("question1", value);
                }
                if let Some(value) = q2 {
                    answers.insert("question2", value);
                }
                answers
            })
    }

    fn table_strategy() -> impl Strategy<Value = DecisionTable> {
        prop::collection::vec((0i32..4, answer_value_strategy()), 1..6).prop_map(|specs| {
            let rules = specs
                .into_iter()
                .enumerate()
                .map(|(i, (order, value))| {
                    Rule::new(
                        format!("r{}", i),
                        order,
                        format!("rule {}", i),
                        vec![RuleInput::new("question1", value)],
                        format!("p{}", i),
                    )
                    .unwrap()
                })
                .collect();
            DecisionTable::new("t", HitPolicy::First, rules, Some("fallback".to_string()))
        })
    }

    proptest! {
        #[test]
        fn prop_evaluation_is_deterministic(
            table in table_strategy(),
            answers in answers_strategy(),
        ) {
            let first = evaluate(&table, &answers);
            let second = evaluate(&table, &answers);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_first_hit_is_lowest_order_then_earliest(
            table in table_strategy(),
            answers in answers_strategy(),
        ) {
            let expected = table
                .rules()
                .iter()
                .enumerate()
                .filter(|(_, rule)| rule.matches(&answers))
                .min_by_key(|(i, rule)| (rule.order(), *i))
                .map(|(_, rule)| rule.id().to_string());

            let result = evaluate(&table, &answers);
            prop_assert_eq!(result.matched_rule_id.clone(), expected);
            if result.matched_rule_id.is_none() {
                prop_assert_eq!(result.next_part_id.as_deref(), Some("fallback"));
            }
        }
    }
}
