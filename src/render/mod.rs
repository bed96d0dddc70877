//! Terminal and JSON presentation of a session tree.

use colored::Colorize;

use crate::config::AppConfig;
use crate::domain::TreeNode;
use crate::utils::{single_line, truncate_chars};

/// Tag shown in front of branch-origin nodes.
pub const ORIGIN_TAG: &str = "⑂";

/// Default node label: content cut to a character budget, origin markers
/// tagged and highlighted.
#[derive(Debug, Clone, Copy)]
pub struct NodeLabel {
    pub budget: usize,
    pub color: bool,
}

impl NodeLabel {
    /// Budget for a session view; sessions that have branched get a tighter
    /// one since their trees fan out.
    pub fn for_session(config: &AppConfig, multi_branch: bool, color: bool) -> Self {
        let budget = if multi_branch {
            config.label_chars_multi
        } else {
            config.label_chars
        };
        Self { budget, color }
    }

    pub fn label(&self, node: &TreeNode) -> String {
        let text = truncate_chars(&single_line(node.thought.display_content()), self.budget);
        match (node.thought.is_branch_origin, self.color) {
            (true, true) => format!("{} {}", ORIGIN_TAG, text).yellow().to_string(),
            (true, false) => format!("{} {}", ORIGIN_TAG, text),
            (false, true) => text.cyan().to_string(),
            (false, false) => text,
        }
    }
}

/// Box-drawing tree, one node per line:
///
/// ```text
/// A
/// └── B
///     ├── C
///     └── ⑂ B
/// ```
pub fn render_text<F>(root: &TreeNode, label: F) -> String
where
    F: Fn(&TreeNode) -> String,
{
    let mut out = String::new();
    // (node, prefix of its line, whether it is its parent's last child)
    let mut stack: Vec<(&TreeNode, String, Option<bool>)> = vec![(root, String::new(), None)];

    while let Some((node, prefix, last)) = stack.pop() {
        let (connector, child_prefix) = match last {
            None => ("", prefix.clone()),
            Some(true) => ("└── ", format!("{}    ", prefix)),
            Some(false) => ("├── ", format!("{}│   ", prefix)),
        };

        out.push_str(&prefix);
        out.push_str(connector);
        out.push_str(&label(node));
        out.push('\n');

        let count = node.children.len();
        for (i, child) in node.children.iter().enumerate().rev() {
            stack.push((child, child_prefix.clone(), Some(i + 1 == count)));
        }
    }

    out
}

/// Compact JSON with each node's thought attributes beside its `children`.
pub fn render_json(root: &TreeNode) -> Result<String, serde_json::Error> {
    root.to_json()
}
