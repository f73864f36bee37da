// src/core/graph_display.rs

/// A list-file and the files it includes, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionNode {
    pub name: String,
    pub children: Vec<InclusionNode>,
}

impl InclusionNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }
}

/// One line per file, indented by one space per level of inclusion.
pub fn render_simple(root: &InclusionNode) -> Vec<String> {
    let mut lines = Vec::new();
    push_simple(root, 0, &mut lines);
    lines
}

fn push_simple(node: &InclusionNode, depth: usize, lines: &mut Vec<String>) {
    lines.push(format!("{}{}", " ".repeat(depth), node.name));
    for child in &node.children {
        push_simple(child, depth + 1, lines);
    }
}

/// The root on a line of its own, then an ASCII tree of its includes.
///
/// ```text
/// top.lst
/// ├── a.lst
/// │   └── b.lst
/// └── c.lst
/// ```
pub fn render_pretty(root: &InclusionNode) -> Vec<String> {
    let mut lines = vec![root.name.clone()];
    push_children(root, "", &mut lines);
    lines
}

fn push_children(node: &InclusionNode, prefix: &str, lines: &mut Vec<String>) {
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last = i + 1 == count;
        let connector = if is_last { "└── " } else { "├── " };
        lines.push(format!("{}{}{}", prefix, connector, child.name));

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        push_children(child, &child_prefix, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InclusionNode {
        let mut a = InclusionNode::new("a.lst");
        a.children.push(InclusionNode::new("b.lst"));
        let mut root = InclusionNode::new("top.lst");
        root.children.push(a);
        root.children.push(InclusionNode::new("c.lst"));
        root
    }

    #[test]
    fn test_simple_layout() {
        assert_eq!(render_simple(&sample()), vec!["top.lst", " a.lst", "  b.lst", " c.lst"]);
    }

    #[test]
    fn test_pretty_layout() {
        assert_eq!(
            render_pretty(&sample()),
            vec!["top.lst", "├── a.lst", "│   └── b.lst", "└── c.lst"]
        );
    }

    #[test]
    fn test_lone_file() {
        let root = InclusionNode::new("top.lst");
        assert_eq!(render_simple(&root), vec!["top.lst"]);
        assert_eq!(render_pretty(&root), vec!["top.lst"]);
    }
}
