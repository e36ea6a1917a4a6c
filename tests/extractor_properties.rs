// tests/extractor_properties.rs

use std::path::Path;

use proptest::prelude::*;

use docci::markdown::extract_blocks;
use docci::tags::TagCatalog;

fn language() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("bash".to_string()),
        Just("sh docci-session".to_string()),
        Just("python docci-file=app.py".to_string()),
        Just("bash docci-output-contains=\"a b\"".to_string()),
        Just("console docci-ignore".to_string()),
    ]
}

fn body_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z ]{0,12}".prop_map(|s| format!("echo {s}")),
        Just(String::new()),
        Just("# comment".to_string()),
        Just("inline ``` text".to_string()),
    ]
}

prop_compose! {
    fn block()(info in language(), body in prop::collection::vec(body_line(), 0..5)) -> String {
        format!("```{info}\n{}\n```\n", body.join("\n"))
    }
}

prop_compose! {
    fn document()(
        blocks in prop::collection::vec(block(), 0..8),
        prose in "[A-Za-z .]{0,20}",
    ) -> (usize, String) {
        let doc = blocks
            .iter()
            .map(|b| format!("{prose}\n\n{b}"))
            .collect::<String>();
        (blocks.len(), doc)
    }
}

proptest! {
    #[test]
    fn arbitrary_text_never_panics(text in "\\PC{0,200}") {
        let _ = extract_blocks(&text, Path::new("doc.md"), &TagCatalog::builtin());
    }

    #[test]
    fn blocks_are_found_in_order_with_dense_indices((count, doc) in document()) {
        let blocks = extract_blocks(&doc, Path::new("doc.md"), &TagCatalog::builtin())
            .expect("generated documents only use known tags");

        prop_assert_eq!(blocks.len(), count);
        for (i, block) in blocks.iter().enumerate() {
            prop_assert_eq!(block.index(), i);
            if i > 0 {
                prop_assert!(block.line() > blocks[i - 1].line());
            }
        }
    }
}
