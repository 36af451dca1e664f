// ============================================================
// Layer 3 — Command Tree Domain Type
// ============================================================
// A shell command seen as a tree rather than a token string:
//
//   find . -name "*.c" | xargs grep expr
//
//   <root>
//     ├── find
//     │     ├── .            (argument of the head command)
//     │     └── -name        (flag)
//     │           └── "*.c"  (argument of the flag)
//     └── xargs
//           ├── grep
//           ... and so on
//
// The tree serves two purposes:
//
//   1. The tree decoder topology trains on a *linearized
//      skeleton* of this tree: a depth-first traversal with
//      explicit "(" and ")" markers, so tree structure can be
//      carried through an ordinary id sequence.
//
//   2. Evaluation scores a prediction by its *template*: the
//      same tree with every literal argument replaced by a
//      placeholder category (File, Pattern, Number, Permission),
//      so "find . -name '*.c'" and "find /tmp -name foo" count
//      as the same command shape.
//
// Reference: Dong & Lapata (2016) — Language to Logical Form
//            with Neural Attention (seq2tree)

use serde::{Deserialize, Serialize};

/// What role a node plays inside the command tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Pipeline root — its children are the piped commands in order
    Root,
    /// A head command such as `find` or `grep`
    Command,
    /// A flag such as `-name` or `-type`
    Flag,
    /// A literal argument such as a path, pattern or number
    Argument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandNode {
    pub kind: NodeKind,
    pub value: String,
    pub children: Vec<CommandNode>,
}

impl CommandNode {
    fn new(kind: NodeKind, value: impl Into<String>) -> Self {
        Self { kind, value: value.into(), children: Vec::new() }
    }
}

/// A full command (possibly a pipeline) in tree form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTree {
    pub root: CommandNode,
}

/// Value of the implicit pipeline root node in skeleton form.
pub const ROOT_TOKEN: &str = "<root>";
/// Skeleton marker opening a child list.
pub const OPEN_TOKEN: &str = "(";
/// Skeleton marker closing a child list.
pub const CLOSE_TOKEN: &str = ")";

impl CommandTree {
    /// Parse a whitespace-tokenized command into a tree.
    ///
    /// Attachment rules, applied left to right per pipeline stage:
    ///   - the first token is the head command
    ///   - a token starting with '-' (and not a bare number) is a flag
    ///   - any other token is an argument, attached to the most
    ///     recent childless flag if one exists, else to the head
    ///   - "|" starts a new pipeline stage
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut root = CommandNode::new(NodeKind::Root, ROOT_TOKEN);

        for segment in tokens.split(|t| t.as_ref() == "|") {
            let mut iter = segment.iter().map(|t| t.as_ref());
            let head = match iter.next() {
                Some(h) => h,
                None => continue, // stray pipe, nothing to attach
            };
            let mut command = CommandNode::new(NodeKind::Command, head);

            for token in iter {
                if is_flag_token(token) {
                    command.children.push(CommandNode::new(NodeKind::Flag, token));
                } else {
                    let node = CommandNode::new(NodeKind::Argument, token);
                    match command
                        .children
                        .iter_mut()
                        .rev()
                        .find(|c| c.kind == NodeKind::Flag && c.children.is_empty())
                    {
                        Some(flag) => flag.children.push(node),
                        None => command.children.push(node),
                    }
                }
            }
            root.children.push(command);
        }

        Self { root }
    }

    /// Depth-first linearization with explicit child-list markers.
    ///
    ///   find . -name *.c
    ///   → <root> ( find ( . -name ( *.c ) ) )
    pub fn to_skeleton_tokens(&self) -> Vec<String> {
        let mut out = Vec::new();
        linearize(&self.root, &mut out);
        out
    }

    /// Parse a linearized skeleton back into a tree. Returns None
    /// on malformed input (unbalanced markers, missing root) rather
    /// than panicking — decoded model output is not trusted.
    pub fn from_skeleton_tokens<S: AsRef<str>>(tokens: &[S]) -> Option<Self> {
        let tokens: Vec<&str> = tokens.iter().map(|t| t.as_ref()).collect();
        let mut pos = 0usize;
        let root = parse_node(&tokens, &mut pos, 0)?;
        if pos != tokens.len() || root.kind != NodeKind::Root {
            return None;
        }
        Some(Self { root })
    }

    /// The tree with every literal argument masked by its
    /// placeholder category. Commands and flags are kept verbatim.
    pub fn template(&self) -> Self {
        Self { root: mask_arguments(&self.root) }
    }

    /// The template flattened back to tokens in command order,
    /// used for template-match scoring.
    pub fn template_tokens(&self) -> Vec<String> {
        let mut out = Vec::new();
        flatten(&mask_arguments(&self.root), &mut out);
        out
    }
}

fn is_flag_token(token: &str) -> bool {
    token.len() > 1
        && token.starts_with('-')
        && !token[1..].chars().all(|c| c.is_ascii_digit())
}

fn linearize(node: &CommandNode, out: &mut Vec<String>) {
    out.push(node.value.clone());
    if !node.children.is_empty() {
        out.push(OPEN_TOKEN.to_string());
        for child in &node.children {
            linearize(child, out);
        }
        out.push(CLOSE_TOKEN.to_string());
    }
}

// Grammar: node := VALUE [ "(" node* ")" ]
fn parse_node(tokens: &[&str], pos: &mut usize, depth: usize) -> Option<CommandNode> {
    let value = *tokens.get(*pos)?;
    if value == OPEN_TOKEN || value == CLOSE_TOKEN {
        return None;
    }
    *pos += 1;

    let kind = if depth == 0 {
        NodeKind::Root
    } else if depth == 1 {
        NodeKind::Command
    } else if is_flag_token(value) {
        NodeKind::Flag
    } else {
        NodeKind::Argument
    };
    let mut node = CommandNode::new(kind, value);

    if tokens.get(*pos) == Some(&OPEN_TOKEN) {
        *pos += 1;
        while tokens.get(*pos) != Some(&CLOSE_TOKEN) {
            node.children.push(parse_node(tokens, pos, depth + 1)?);
        }
        *pos += 1; // consume ")"
    }
    Some(node)
}

fn mask_arguments(node: &CommandNode) -> CommandNode {
    let value = if node.kind == NodeKind::Argument {
        classify_argument(&node.value).to_string()
    } else {
        node.value.clone()
    };
    CommandNode {
        kind: node.kind,
        value,
        children: node.children.iter().map(mask_arguments).collect(),
    }
}

fn flatten(node: &CommandNode, out: &mut Vec<String>) {
    if node.kind == NodeKind::Root {
        for (i, child) in node.children.iter().enumerate() {
            if i > 0 {
                out.push("|".to_string());
            }
            flatten(child, out);
        }
        return;
    }
    out.push(node.value.clone());
    for child in &node.children {
        flatten(child, out);
    }
}

/// Placeholder category for a literal argument.
fn classify_argument(value: &str) -> &'static str {
    let trimmed = value.trim_matches(|c| c == '"' || c == '\'');
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);

    if !digits.is_empty() && digits.chars().all(|c| ('0'..='7').contains(&c))
        && (digits.len() == 3 || digits.len() == 4)
        && !trimmed.starts_with(['+', '-'])
    {
        "Permission"
    } else if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        "Number"
    } else if trimmed.contains('/') || trimmed.starts_with('.') || trimmed.starts_with('~') {
        "File"
    } else {
        "Pattern"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_flag_argument_attachment() {
        let tree = CommandTree::from_tokens(&toks("find . -name *.c"));
        let find = &tree.root.children[0];
        assert_eq!(find.value, "find");
        // "." attaches to the head, "*.c" to the -name flag
        assert_eq!(find.children[0].kind, NodeKind::Argument);
        assert_eq!(find.children[1].value, "-name");
        assert_eq!(find.children[1].children[0].value, "*.c");
    }

    #[test]
    fn test_pipeline_becomes_sibling_commands() {
        let tree = CommandTree::from_tokens(&toks("find . -name *.py | xargs grep xrange"));
        assert_eq!(tree.root.children.len(), 2);
        assert_eq!(tree.root.children[0].value, "find");
        assert_eq!(tree.root.children[1].value, "xargs");
    }

    #[test]
    fn test_skeleton_round_trip() {
        let tree = CommandTree::from_tokens(&toks("find /usr -name temp -type f"));
        let skeleton = tree.to_skeleton_tokens();
        assert_eq!(skeleton[0], ROOT_TOKEN);
        let parsed = CommandTree::from_skeleton_tokens(&skeleton).unwrap();
        assert_eq!(parsed, tree);
    }

    #[test]
    fn test_malformed_skeleton_is_rejected() {
        assert!(CommandTree::from_skeleton_tokens(&toks("<root> ( find (")).is_none());
        assert!(CommandTree::from_skeleton_tokens(&toks(") (")).is_none());
    }

    #[test]
    fn test_template_masks_literals_only() {
        let tree = CommandTree::from_tokens(&toks("find /usr/share -type d -mtime -7"));
        assert_eq!(
            tree.template_tokens(),
            toks("find File -type Pattern -mtime Number")
        );
    }

    #[test]
    fn test_template_match_ignores_literal_values() {
        let a = CommandTree::from_tokens(&toks("find . -name *.c"));
        let b = CommandTree::from_tokens(&toks("find /tmp -name foo"));
        assert_eq!(a.template_tokens(), b.template_tokens());
    }

    #[test]
    fn test_permission_and_number_categories() {
        assert_eq!(classify_argument("4000"), "Permission");
        assert_eq!(classify_argument("42"), "Number");
        assert_eq!(classify_argument("-7"), "Number");
        assert_eq!(classify_argument("/usr"), "File");
    }
}
