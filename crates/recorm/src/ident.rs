//! SQL identifier quoting and table-name derivation.
//!
//! Identifiers are split on `.` and every segment is wrapped in the session's quote
//! character, so `post.title` becomes `` `post`.`title` `` (or `"post"."title"`).
//! A quote character inside a segment is doubled. The bare `*` wildcard is never quoted.
//!
//! Table names are derived from a model's upper-camel-case type name:
//! `UserAccount` → `user_account`. Every uppercase letter after the first character
//! gets its own underscore, so `HTTPLog` → `h_t_t_p_log`.

use crate::quote::QuoteStyle;

/// Quote one identifier segment.
pub(crate) fn write_segment(out: &mut String, segment: &str, style: QuoteStyle) {
    if segment == "*" {
        out.push('*');
        return;
    }
    let q = style.as_char();
    out.push(q);
    for ch in segment.chars() {
        if ch == q {
            out.push(q);
        }
        out.push(ch);
    }
    out.push(q);
}

/// Quote a possibly dotted identifier, segment by segment.
///
/// ```ignore
/// assert_eq!(quote_ident("post.title", QuoteStyle::Backtick), "`post`.`title`");
/// ```
pub fn quote_ident(fragment: &str, style: QuoteStyle) -> String {
    let mut out = String::with_capacity(fragment.len() + 4);
    for (i, segment) in fragment.split('.').enumerate() {
        if i > 0 {
            out.push('.');
        }
        write_segment(&mut out, segment, style);
    }
    out
}

/// Remove every occurrence of the quote character.
pub fn unquote_ident(quoted: &str, style: QuoteStyle) -> String {
    quoted.chars().filter(|&c| c != style.as_char()).collect()
}

/// Convert an upper-camel-case type name to its snake-case table name (unquoted).
pub fn snake_case(type_name: &str) -> String {
    let mut out = String::with_capacity(type_name.len() + 4);
    for (i, ch) in type_name.chars().enumerate() {
        if i > 0 && ch.is_uppercase() {
            out.push('_');
        }
        out.extend(ch.to_lowercase());
    }
    out
}

/// Derive the quoted table name for a type name.
pub fn table_name(type_name: &str, style: QuoteStyle) -> String {
    quote_ident(&snake_case(type_name), style)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BT: QuoteStyle = QuoteStyle::Backtick;
    const DQ: QuoteStyle = QuoteStyle::Double;

    #[test]
    fn quotes_simple_identifier() {
        assert_eq!(quote_ident("name", BT), "`name`");
        assert_eq!(quote_ident("name", DQ), "\"name\"");
    }

    #[test]
    fn quotes_each_dotted_segment() {
        assert_eq!(quote_ident("post.title", BT), "`post`.`title`");
        assert_eq!(quote_ident("public.post.title", DQ), "\"public\".\"post\".\"title\"");
    }

    #[test]
    fn wildcard_is_not_quoted() {
        assert_eq!(quote_ident("*", BT), "*");
        assert_eq!(quote_ident("post.*", BT), "`post`.*");
    }

    #[test]
    fn embedded_quote_is_doubled() {
        assert_eq!(quote_ident("we\"ird", DQ), "\"we\"\"ird\"");
    }

    #[test]
    fn unquote_strips_quote_chars() {
        assert_eq!(unquote_ident("`user_account`", BT), "user_account");
        assert_eq!(unquote_ident("\"user_account\"", DQ), "user_account");
    }

    #[test]
    fn snake_case_inserts_underscores_on_camel_boundaries() {
        assert_eq!(snake_case("User"), "user");
        assert_eq!(snake_case("UserAccount"), "user_account");
        assert_eq!(snake_case("BlogPostComment"), "blog_post_comment");
    }

    #[test]
    fn snake_case_splits_every_uppercase_letter() {
        assert_eq!(snake_case("HTTPLog"), "h_t_t_p_log");
        assert_eq!(snake_case("ABC"), "a_b_c");
    }

    #[test]
    fn table_name_is_quoted_and_deterministic() {
        let first = table_name("UserAccount", BT);
        let second = table_name("UserAccount", BT);
        assert_eq!(first, "`user_account`");
        assert_eq!(first, second);
        assert_eq!(table_name("UserAccount", DQ), "\"user_account\"");
    }

    #[test]
    fn table_name_supports_qualified_names() {
        assert_eq!(table_name("Blog.PostItem", BT), "`blog`.`_post_item`");
    }
}
