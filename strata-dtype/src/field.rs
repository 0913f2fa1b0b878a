use std::sync::Arc;

use itertools::Itertools;

/// A name for a column, or the name of a series or index.
pub type FieldName = Arc<str>;

/// An ordered list of column names.
pub type FieldNames = Arc<[FieldName]>;

/// Build [`FieldNames`] from anything string-like.
pub fn field_names<I, S>(names: I) -> FieldNames
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(|n| FieldName::from(n.as_ref())).collect()
}

/// Returns the position of `name` within `names`.
pub fn position_of(names: &[FieldName], name: &str) -> Option<usize> {
    names.iter().position(|n| n.as_ref() == name)
}

/// Render a list of names the way error messages print them.
pub fn display_names(names: &[FieldName]) -> String {
    format!("[{}]", names.iter().map(|n| format!("'{n}'")).join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions() {
        let names = field_names(["a", "b"]);
        assert_eq!(position_of(&names, "b"), Some(1));
        assert_eq!(position_of(&names, "x"), None);
        assert_eq!(display_names(&names), "['a', 'b']");
    }
}
