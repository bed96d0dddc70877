use uuid::Uuid;

use super::thought::Thought;

/// A thought placed in the session hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub thought: Thought,
    pub children: Vec<TreeNode>,
}

enum JsonStep<'a> {
    Open(&'a TreeNode, bool),
    Close,
}

impl TreeNode {
    pub fn id(&self) -> Uuid {
        self.thought.thought_id
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children.iter().map(|child| (child, depth + 1)));
        }
        deepest
    }

    /// Depth-first pre-order traversal, children in their stored order.
    pub fn iter(&self) -> DepthFirst<'_> {
        DepthFirst { stack: vec![self] }
    }

    /// Thoughts in depth-first pre-order.
    pub fn flatten(&self) -> Vec<&Thought> {
        self.iter().map(|node| &node.thought).collect()
    }

    pub fn find(&self, thought_id: Uuid) -> Option<&TreeNode> {
        self.iter().find(|node| node.id() == thought_id)
    }

    /// Compact JSON with each node's thought attributes flattened next to
    /// its `children` array, the shape hierarchical layout tools expect.
    ///
    /// Written with an explicit stack; the nesting depth of a long chat is
    /// bounded only by its length.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        let mut steps = vec![JsonStep::Open(self, true)];

        while let Some(step) = steps.pop() {
            match step {
                JsonStep::Open(node, first) => {
                    if !first {
                        out.push(',');
                    }
                    let attributes = serde_json::to_string(&node.thought)?;
                    // `attributes` is a JSON object; reopen it to append children.
                    out.push_str(attributes.strip_suffix('}').unwrap_or(&attributes));
                    out.push_str(",\"children\":[");

                    steps.push(JsonStep::Close);
                    for (i, child) in node.children.iter().enumerate().rev() {
                        steps.push(JsonStep::Open(child, i == 0));
                    }
                }
                JsonStep::Close => out.push_str("]}"),
            }
        }

        Ok(out)
    }
}

// Long chats nest thousands of levels deep; unlink children iteratively so
// dropping a tree never recurses.
impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

pub struct DepthFirst<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
