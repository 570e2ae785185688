//! Text content of node boxes and the sizes it needs.
//!
//! Layout and rendering share [`NodeContent`] so that a box is always drawn
//! with exactly the lines it was measured with.

use trazo_core::{
    geometry::{Insets, Size},
    graph::{Node, NodeCategory},
    style::TextDefinition,
};

/// Space between a box border and its text.
const NODE_PADDING: Insets = Insets::new(8.0, 12.0, 8.0, 12.0);

const MIN_NODE_SIZE: Size = Size::new(80.0, 36.0);

/// Text definitions for the three kinds of line inside a node box.
#[derive(Debug, Clone, PartialEq)]
pub struct Typography {
    title: TextDefinition,
    detail: TextDefinition,
    row: TextDefinition,
}

impl Typography {
    /// Derives every line style from the base font size.
    pub fn new(font_size: u16) -> Self {
        let font_size = font_size.max(6);
        Self {
            title: TextDefinition::new("sans-serif", font_size + 1),
            detail: TextDefinition::new("sans-serif", font_size.saturating_sub(2)),
            row: TextDefinition::new("sans-serif", font_size),
        }
    }

    pub fn title(&self) -> &TextDefinition {
        &self.title
    }

    pub fn detail(&self) -> &TextDefinition {
        &self.detail
    }

    pub fn row(&self) -> &TextDefinition {
        &self.row
    }

    /// Space reserved above group members for the group label.
    pub fn group_label_height(&self) -> f32 {
        self.detail.line_height() + 4.0
    }
}

impl Default for Typography {
    fn default() -> Self {
        Self::new(13)
    }
}

/// The lines shown inside a node box.
///
/// A box has a header holding the title and an optional detail line, then
/// one row per field (table columns).
#[derive(Debug, Clone, PartialEq)]
pub struct NodeContent {
    title: String,
    detail: Option<String>,
    rows: Vec<String>,
}

impl NodeContent {
    pub fn of(node: &Node) -> Self {
        let detail = match node.category() {
            NodeCategory::Service => node
                .attribute("kind")
                .filter(|kind| *kind != node.label())
                .map(str::to_string),
            NodeCategory::Container => node.attribute("type").map(|kind| match node.attribute("size") {
                Some(size) => format!("{kind} [{size}]"),
                None => kind.to_string(),
            }),
            NodeCategory::Table | NodeCategory::Value => None,
        };

        Self {
            title: node.label().to_string(),
            detail,
            rows: node.fields().iter().map(|f| f.display_text()).collect(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Inner padding of every box.
    pub fn padding() -> Insets {
        NODE_PADDING
    }

    /// Height of the header band, padding included.
    pub fn header_height(&self, typography: &Typography) -> f32 {
        let mut height = typography.title().measure(&self.title).height();
        if let Some(detail) = &self.detail {
            height += typography.detail().measure(detail).height();
        }
        height + NODE_PADDING.vertical_sum()
    }

    /// Outer size of the box.
    pub fn size(&self, typography: &Typography) -> Size {
        let mut width = typography.title().measure(&self.title).width();
        if let Some(detail) = &self.detail {
            width = width.max(typography.detail().measure(detail).width());
        }
        for row in &self.rows {
            width = width.max(typography.row().measure(row).width());
        }

        let mut height = self.header_height(typography);
        if !self.rows.is_empty() {
            height += self.rows.len() as f32 * typography.row().line_height()
                + NODE_PADDING.vertical_sum();
        }

        Size::new(width + NODE_PADDING.horizontal_sum(), height).max(MIN_NODE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use trazo_core::graph::Field;

    use super::*;

    #[test]
    fn test_service_detail_is_kind() {
        let node = Node::new("web", "web server", NodeCategory::Service).with_attribute("kind", "EC2");
        let content = NodeContent::of(&node);
        assert_eq!(content.title(), "web server");
        assert_eq!(content.detail(), Some("EC2"));
    }

    #[test]
    fn test_service_without_label_has_no_detail() {
        let node = Node::new("EC2_1", "EC2", NodeCategory::Service).with_attribute("kind", "EC2");
        assert_eq!(NodeContent::of(&node).detail(), None);
    }

    #[test]
    fn test_container_detail_shows_size() {
        let node = Node::new("$", "$", NodeCategory::Container)
            .with_attribute("type", "object")
            .with_attribute("size", "3");
        assert_eq!(NodeContent::of(&node).detail(), Some("object [3]"));
    }

    #[test]
    fn test_table_rows_grow_the_box() {
        let typography = Typography::default();
        let bare = Node::new("users", "users", NodeCategory::Table);
        let with_rows = bare
            .clone()
            .with_field(Field::new("id").with_primary_key(true))
            .with_field(Field::new("a_rather_long_column_name").with_detail("varchar"));

        let small = NodeContent::of(&bare).size(&typography);
        let large = NodeContent::of(&with_rows).size(&typography);
        assert!(large.height() > small.height());
        assert!(large.width() > small.width());
        assert_eq!(NodeContent::of(&with_rows).rows().len(), 2);
    }

    #[test]
    fn test_minimum_size() {
        let node = Node::new("x", "x", NodeCategory::Value);
        let size = NodeContent::of(&node).size(&Typography::default());
        assert!(size.width() >= 80.0);
        assert!(size.height() >= 36.0);
    }
}
