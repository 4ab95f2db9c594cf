//! Compiled patterns for text-level extraction.
//!
//! When a structured parse is unavailable the extractors read the raw text
//! with these patterns instead. They are compiled once, like the tree-sitter
//! queries, and shared by every worker.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ParseError;

/// Quoted string argument with one capture group per quote style.
const QUOTED_ARG: &str = r#"(?:'(?P<sq>[^'\n]*)'|"(?P<dq>[^"\n]*)"|`(?P<bq>[^`]*)`)"#;

/// Every pattern the fallback path uses.
#[derive(Debug)]
pub struct Patterns {
    /// `receiver.method(<quoted url>`
    pub member_call: Regex,
    /// `callee(<quoted url>`
    pub direct_call: Regex,
    /// `method: 'POST'` inside an options object.
    pub method_option: Regex,
    /// `const NAME = '<string>'`
    pub string_constant: Regex,
    /// `const { a, b } = await` immediately before a call.
    pub awaited_destructure: Regex,
    /// Interface declaration header up to its opening brace.
    pub interface_decl: Regex,
    /// Object type alias header up to its opening brace.
    pub type_alias_decl: Regex,
    /// Class declaration header up to its opening brace.
    pub class_decl: Regex,
    /// One member line inside an interface, type literal or class body.
    pub member_field: Regex,
    /// `export [default] function|class|const Name`
    pub exported_decl: Regex,
    /// Component function with a destructured first parameter.
    pub destructured_props: Regex,
    /// `props.name`
    pub props_access: Regex,
    /// `const [value, setValue] = useState<T>(init)`
    pub use_state: Regex,
    /// A hook call such as `useEffect(`.
    pub hook_call: Regex,
    /// `import ... from '...'`
    pub import_static: Regex,
    /// `import '...'`
    pub import_side_effect: Regex,
    /// `import('...')`
    pub import_dynamic: Regex,
    /// A JSX opening tag.
    pub jsx_tag: Regex,
    /// JSX returned from a function body or arrow.
    pub jsx_return: Regex,
    /// `export default Name;` or `export default memo(Name);`
    pub default_export: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

/// Returns the compiled fallback patterns.
pub fn patterns() -> Result<&'static Patterns, ParseError> {
    if let Some(patterns) = PATTERNS.get() {
        return Ok(patterns);
    }
    let compiled = Patterns::compile()?;
    Ok(PATTERNS.get_or_init(|| compiled))
}

impl Patterns {
    fn compile() -> Result<Self, ParseError> {
        Ok(Self {
            member_call: Regex::new(&format!(
                r"(?P<recv>\$?[A-Za-z_][\w$]*(?:\.[A-Za-z_$][\w$]*)*)\s*\.\s*(?P<method>[A-Za-z]+)\s*(?:<[^>()]*>)?\(\s*{QUOTED_ARG}"
            ))?,
            direct_call: Regex::new(&format!(
                r"(?P<callee>\$?[A-Za-z_][\w$]*)\s*(?:<[^>()]*>)?\(\s*{QUOTED_ARG}"
            ))?,
            method_option: Regex::new(r#"\bmethod\s*:\s*['"`](?P<m>[A-Za-z]+)['"`]"#)?,
            string_constant: Regex::new(&format!(
                r"\b(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*(?::\s*string\s*)?=\s*{QUOTED_ARG}\s*[;\n]"
            ))?,
            awaited_destructure: Regex::new(
                r"(?:const|let|var)\s*\{(?P<fields>[^}]*(?:\{[^}]*\}[^}]*)?)\}\s*=\s*await\s*$",
            )?,
            interface_decl: Regex::new(
                r"(?m)^[ \t]*(?:export\s+)?(?:default\s+)?(?:declare\s+)?interface\s+(?P<name>[A-Za-z_$][\w$]*)(?:\s*<[^{]*?>)?(?:\s+extends\s+(?P<ext>[^{]+?))?\s*\{",
            )?,
            type_alias_decl: Regex::new(
                r"(?m)^[ \t]*(?:export\s+)?(?:declare\s+)?type\s+(?P<name>[A-Za-z_$][\w$]*)(?:\s*<[^=]*?>)?\s*=\s*\{",
            )?,
            class_decl: Regex::new(
                r"(?m)^[ \t]*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(?P<name>[A-Za-z_$][\w$]*)(?:\s*<[^{]*?>)?(?:\s+extends\s+(?P<ext>[\w$.]+)(?:\s*<[^{]*?>)?)?(?:\s+implements\s+[^{]+?)?\s*\{",
            )?,
            member_field: Regex::new(
                r#"^\s*(?:(?:public|private|protected|readonly|static|declare|override)\s+)*(?P<name>[A-Za-z_$][\w$]*|'[^']+'|"[^"]+")(?P<opt>\?)?!?\s*(?::\s*(?P<ty>[^;=]+?))?\s*(?:=\s*(?P<val>[^;]+?))?\s*[;,]?\s*$"#,
            )?,
            exported_decl: Regex::new(
                r"(?m)^[ \t]*export\s+(?P<default>default\s+)?(?:async\s+)?(?:function\*?|class|const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)",
            )?,
            destructured_props: Regex::new(
                r"(?:function\s+(?P<fname>[A-Z][\w$]*)\s*(?:<[^>(]*>)?\(|(?:const|let)\s+(?P<cname>[A-Z][\w$]*)\s*(?::[^=]+)?=\s*(?:React\.)?(?:memo|forwardRef)?\(?\s*(?:async\s*)?\()\s*\{(?P<props>[^}]*)\}",
            )?,
            props_access: Regex::new(r"\bprops\.(?P<name>[A-Za-z_$][\w$]*)")?,
            use_state: Regex::new(
                r"\[\s*(?P<name>[A-Za-z_$][\w$]*)\s*(?:,\s*[A-Za-z_$][\w$]*\s*)?\]\s*=\s*(?:React\.)?useState\s*(?:<(?P<ty>[^>]+)>)?\(\s*(?P<init>[^)]*?)\s*\)",
            )?,
            hook_call: Regex::new(r"\b(?P<hook>use[A-Z][\w$]*)\s*(?:<[^>()]*>)?\(")?,
            import_static: Regex::new(
                r#"(?m)^[ \t]*import\s+(?P<type>type\s+)?(?P<clause>[^'";]*?)\s*from\s*['"](?P<src>[^'"]+)['"]"#,
            )?,
            import_side_effect: Regex::new(r#"(?m)^[ \t]*import\s*['"](?P<src>[^'"]+)['"]"#)?,
            import_dynamic: Regex::new(r#"\bimport\s*\(\s*['"`](?P<src>[^'"`]+)['"`]\s*\)"#)?,
            jsx_tag: Regex::new(r"<(?P<tag>[A-Za-z][\w.-]*)[\s/>]")?,
            jsx_return: Regex::new(r"(?:\breturn|=>)\s*\(?\s*<[A-Za-z>]")?,
            default_export: Regex::new(
                r"(?m)^[ \t]*export\s+default\s+(?:[\w$.]+\()?(?P<name>[A-Z][\w$]*)\)?\s*;?[ \t]*$",
            )?,
        })
    }
}

/// Returns the quoted argument captured by a pattern built on [`QUOTED_ARG`],
/// with template substitutions normalized.
pub(crate) fn quoted_arg(captures: &regex::Captures<'_>) -> Option<String> {
    if let Some(m) = captures.name("sq").or_else(|| captures.name("dq")) {
        return Some(m.as_str().to_owned());
    }
    captures
        .name("bq")
        .map(|m| crate::syntax::normalize_template(m.as_str()))
}

/// Returns the byte range of the body opened by the `{` ending at
/// `open_end`, excluding both braces.
pub(crate) fn brace_body(text: &str, open_end: usize) -> Option<(usize, usize)> {
    let mut depth = 1usize;
    for (offset, b) in text.as_bytes().get(open_end..)?.iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((open_end, open_end + offset));
                }
            }
            _ => {}
        }
    }
    None
}

/// Returns the byte range of the argument list opened by the `(` ending at
/// `open_end`, excluding both parentheses. Unbalanced input runs to the end.
pub(crate) fn paren_body(text: &str, open_end: usize) -> (usize, usize) {
    let mut depth = 1usize;
    let bytes = text.as_bytes();
    for (offset, b) in bytes.get(open_end..).unwrap_or_default().iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return (open_end, open_end + offset);
                }
            }
            _ => {}
        }
    }
    (open_end.min(text.len()), text.len())
}

/// Splits a body into its lines at brace depth zero, with each line's offset.
pub(crate) fn top_level_lines(body: &str) -> Vec<(usize, &str)> {
    let mut lines = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, b) in body.bytes().enumerate() {
        match b {
            b'{' | b'(' | b'[' => depth += 1,
            b'}' | b')' | b']' => depth -= 1,
            b'\n' | b';' if depth == 0 => {
                lines.push((start, &body[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < body.len() {
        lines.push((start, &body[start..]));
    }
    lines.retain(|(_, l)| !l.trim().is_empty());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        assert!(patterns().is_ok());
    }

    #[test]
    fn test_member_call_captures() {
        let p = patterns().unwrap();
        let caps = p.member_call.captures("await this.http.get<User[]>('/api/users')").unwrap();
        assert_eq!(&caps["recv"], "this.http");
        assert_eq!(&caps["method"], "get");
        assert_eq!(quoted_arg(&caps).as_deref(), Some("/api/users"));
    }

    #[test]
    fn test_template_arg_normalized() {
        let p = patterns().unwrap();
        let caps = p.member_call.captures("api.delete(`/items/${item.id}`)").unwrap();
        assert_eq!(quoted_arg(&caps).as_deref(), Some("/items/{id}"));
    }

    #[test]
    fn test_brace_body() {
        let text = "interface A { b: { c: string }; d: number }";
        let open = text.find('{').unwrap() + 1;
        let (start, end) = brace_body(text, open).unwrap();
        assert_eq!(&text[start..end], " b: { c: string }; d: number ");
    }

    #[test]
    fn test_top_level_lines() {
        let lines = top_level_lines("\n  a: string;\n  b: { c: number };\n");
        let texts: Vec<_> = lines.iter().map(|(_, l)| l.trim()).collect();
        assert_eq!(texts, vec!["a: string", "b: { c: number }"]);
    }

    #[test]
    fn test_default_export_pattern() {
        let p = patterns().unwrap();
        let caps = p.default_export.captures("export default React.memo(UserCard);\n").unwrap();
        assert_eq!(&caps["name"], "UserCard");
        assert!(p.default_export.captures("export default function () {}").is_none());
    }

    #[test]
    fn test_use_state_pattern() {
        let p = patterns().unwrap();
        let caps = p
            .use_state
            .captures("const [items, setItems] = useState<Item[]>([]);")
            .unwrap();
        assert_eq!(&caps["name"], "items");
        assert_eq!(&caps["ty"], "Item[]");
        assert_eq!(&caps["init"], "[]");
    }
}
