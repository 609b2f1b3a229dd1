//! Layer tree conversion
//!
//! Turns the descriptors returned by a tree endpoint into the display tree
//! a tree control shows, creating one [`LazyLayer`] per leaf on the way.

use std::sync::Arc;

use log::warn;

use crate::layer::LazyLayer;
use crate::model::TreeNodeDescriptor;
use crate::source::FeatureSource;
use crate::widget::MapWidget;

/// A node of the display tree.
#[derive(Debug, Clone)]
pub enum TreeNode {
    Category(Category),
    Leaf(Leaf),
}

/// A group of nodes. Never fetched.
#[derive(Debug, Clone)]
pub struct Category {
    pub label: String,
    pub children: Vec<TreeNode>,
    /// Whether the category starts collapsed.
    pub collapsed: bool,
    /// Whether the category offers a checkbox toggling its whole subtree.
    pub select_all: bool,
}

/// A toggleable layer.
#[derive(Debug, Clone)]
pub struct Leaf {
    pub label: String,
    pub layer: LazyLayer,
}

impl Leaf {
    /// Returns the data URL the layer loads from.
    pub fn url(&self) -> Option<&str> {
        self.layer.url()
    }
}

impl TreeNode {
    pub fn label(&self) -> &str {
        match self {
            TreeNode::Category(category) => &category.label,
            TreeNode::Leaf(leaf) => &leaf.label,
        }
    }

    pub fn as_category(&self) -> Option<&Category> {
        match self {
            TreeNode::Category(category) => Some(category),
            TreeNode::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            TreeNode::Category(_) => None,
            TreeNode::Leaf(leaf) => Some(leaf),
        }
    }

    /// Number of levels below and including this node.
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 1,
            TreeNode::Category(category) => {
                1 + category
                    .children
                    .iter()
                    .map(TreeNode::depth)
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    /// Collects every leaf below and including this node, depth first.
    pub fn leaves(&self) -> Vec<&Leaf> {
        let mut out = Vec::new();
        collect_leaves(std::slice::from_ref(self), &mut out);
        out
    }
}

/// Every leaf in `nodes`, depth first, in display order.
pub fn leaves(nodes: &[TreeNode]) -> Vec<&Leaf> {
    let mut out = Vec::new();
    collect_leaves(nodes, &mut out);
    out
}

/// The first leaf labelled `label`, depth first.
pub fn find_leaf<'a>(nodes: &'a [TreeNode], label: &str) -> Option<&'a Leaf> {
    leaves(nodes).into_iter().find(|leaf| leaf.label == label)
}

fn collect_leaves<'a>(nodes: &'a [TreeNode], out: &mut Vec<&'a Leaf>) {
    for node in nodes {
        match node {
            TreeNode::Leaf(leaf) => out.push(leaf),
            TreeNode::Category(category) => collect_leaves(&category.children, out),
        }
    }
}

/// Builds display trees whose leaves load through `source` into `widget`.
#[derive(Clone)]
pub struct TreeConverter {
    source: Arc<dyn FeatureSource>,
    widget: Arc<dyn MapWidget>,
}

impl TreeConverter {
    pub fn new(source: Arc<dyn FeatureSource>, widget: Arc<dyn MapWidget>) -> Self {
        Self { source, widget }
    }

    /// Converts root descriptors, preserving order and nesting.
    pub fn convert(&self, descriptors: &[TreeNodeDescriptor]) -> Vec<TreeNode> {
        descriptors
            .iter()
            .map(|descriptor| self.convert_node(descriptor))
            .collect()
    }

    fn convert_node(&self, descriptor: &TreeNodeDescriptor) -> TreeNode {
        if let Some(children) = &descriptor.children {
            return TreeNode::Category(Category {
                label: descriptor.label.clone(),
                children: self.convert(children),
                collapsed: true,
                select_all: true,
            });
        }

        if descriptor.url.is_none() {
            warn!(
                "Layer '{}' has no data URL; showing it will not load anything",
                descriptor.label
            );
        }

        let layer = LazyLayer::new(
            descriptor.label.clone(),
            descriptor.url.clone(),
            descriptor.layer_options(),
            self.source.clone(),
            self.widget.clone(),
        );

        TreeNode::Leaf(Leaf {
            label: descriptor.label.clone(),
            layer,
        })
    }
}

/// Where a control sits on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Which part of a tree row toggles the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSelector {
    /// Clicking the label toggles the layer.
    Layer,
    /// Clicking the label expands or collapses the category.
    Category,
    Both,
    None,
}

/// Presentation options for the tree control.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeControlOptions {
    pub space_symbol: String,
    pub closed_symbol: String,
    pub opened_symbol: String,
    /// Whether the control itself starts folded away.
    pub collapsed: bool,
    pub position: ControlPosition,
    pub label_is_selector: LabelSelector,
}

impl Default for TreeControlOptions {
    fn default() -> Self {
        Self {
            space_symbol: " ".to_string(),
            closed_symbol: "+".to_string(),
            opened_symbol: "-".to_string(),
            collapsed: false,
            position: ControlPosition::BottomRight,
            label_is_selector: LabelSelector::Both,
        }
    }
}
