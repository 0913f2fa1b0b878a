//! Building deterministic names and graph fragments.

use std::sync::Arc;

use strata_frame::Frame;
use strata_graph::{Key, Task, Tokenizer};

use crate::Datum;

/// `"{prefix}-{digest}"` where the digest covers everything fed to `tokenizer`.
pub fn deterministic_name(prefix: &str, tokenizer: Tokenizer) -> Arc<str> {
    strata_graph::deterministic_name(prefix, tokenizer).into()
}

/// Bind `(name, i)` to the `i`-th task.
pub fn build_graph(name: &Arc<str>, tasks: Vec<Task<Datum>>) -> Vec<(Key, Task<Datum>)> {
    tasks
        .into_iter()
        .enumerate()
        .map(|(i, task)| (Key::new(name.clone(), i), task))
        .collect()
}

/// Feed the full content of a local frame to `tokenizer`.
pub fn tokenize_frame(tokenizer: Tokenizer, frame: &Frame) -> Tokenizer {
    let tokenizer = tokenizer
        .arg(&frame.names()[..])
        .arg(&frame.index().name())
        .arg(frame.index().labels().values());
    frame
        .columns()
        .iter()
        .fold(tokenizer, |t, column| t.arg(column.values()))
}

#[cfg(test)]
mod test {
    use strata_frame::Column;

    use super::*;

    fn frame(values: Vec<i64>) -> Frame {
        Frame::from_columns([("a", Column::from(values))]).unwrap()
    }

    #[test]
    fn content_decides_the_token() {
        let token = |f: &Frame| tokenize_frame(Tokenizer::new("from-frame"), f).finish();
        assert_eq!(token(&frame(vec![1, 2])), token(&frame(vec![1, 2])));
        assert_ne!(token(&frame(vec![1, 2])), token(&frame(vec![1, 3])));
    }

    #[test]
    fn graph_keys_are_numbered() {
        let name: Arc<str> = "x".into();
        let graph = build_graph(&name, vec![Task::Literal(Datum::Scalar(1.into())); 2]);
        assert_eq!(graph[1].0, Key::new("x", 1));
    }
}
