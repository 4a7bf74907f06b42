//! Position-aware side index over workflow YAML.
//!
//! `serde_yaml` gives us the semantic tree but drops source positions. This
//! module re-reads the same text with the `yaml-rust2` event parser, keeps a
//! minimal node tree with start offsets, and answers "which line does this
//! job/step begin on". The two trees are zipped by declaration order in
//! [`crate::parser::workflow`].

use std::collections::HashMap;

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::Marker;

use crate::error::Result;

/// A node of the structural tree. Offsets are character offsets into the source.
#[derive(Debug, Clone)]
pub struct Node {
    pub start: usize,
    pub kind: NodeKind,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Scalar(String),
    Sequence(Vec<Node>),
    Mapping(Vec<(Node, Node)>),
    Alias,
}

impl Node {
    pub fn as_scalar(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Look up the value of a scalar key in a mapping node.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match &self.kind {
            NodeKind::Mapping(entries) => entries
                .iter()
                .find(|(k, _)| k.as_scalar() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

/// A job entry of the `jobs` mapping, in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct IndexedJob<'a> {
    pub key: &'a str,
    /// Offset of the job's mapping key.
    pub start: usize,
    pub node: &'a Node,
}

/// Structural index of one workflow file.
#[derive(Debug, Clone)]
pub struct StructuralIndex {
    root: Option<Node>,
    line_starts: Vec<usize>,
}

impl StructuralIndex {
    /// Parse YAML text. Malformed input fails the whole parse.
    pub fn parse(text: &str) -> Result<Self> {
        let mut builder = TreeBuilder::default();
        let mut parser = Parser::new(text.chars());
        parser.load(&mut builder, false)?;

        Ok(Self {
            root: builder.root,
            line_starts: line_starts(text),
        })
    }

    /// Jobs of the top-level `jobs` mapping in declaration order.
    pub fn jobs(&self) -> Vec<IndexedJob<'_>> {
        let Some(NodeKind::Mapping(entries)) = self
            .root
            .as_ref()
            .and_then(|root| root.get("jobs"))
            .map(|jobs| &jobs.kind)
        else {
            return Vec::new();
        };

        entries
            .iter()
            .filter_map(|(key, node)| {
                key.as_scalar().map(|k| IndexedJob {
                    key: k,
                    start: key.start,
                    node,
                })
            })
            .collect()
    }

    /// Start offsets of a job's steps, or `None` when the job declares no
    /// `steps` sequence (e.g. a reusable-workflow call).
    pub fn steps_of(&self, job: &IndexedJob<'_>) -> Option<Vec<usize>> {
        match &job.node.get("steps")?.kind {
            NodeKind::Sequence(items) => Some(items.iter().map(|item| item.start).collect()),
            _ => None,
        }
    }

    /// 1-based line number containing `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }
}

fn line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (idx, ch) in text.chars().enumerate() {
        if ch == '\n' {
            starts.push(idx + 1);
        }
    }
    starts
}

/// Open collection: start offset, anchor id (0 when none), children.
enum Frame {
    Sequence(usize, usize, Vec<Node>),
    Mapping(usize, usize, Vec<(Node, Node)>, Option<Node>),
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    anchors: HashMap<usize, Node>,
    root: Option<Node>,
}

impl TreeBuilder {
    fn push_anchored(&mut self, anchor_id: usize, node: Node) {
        if anchor_id > 0 {
            self.anchors.insert(anchor_id, node.clone());
        }
        self.push_node(node);
    }

    fn push_node(&mut self, node: Node) {
        match self.stack.last_mut() {
            None => {
                // Only the first document is indexed.
                if self.root.is_none() {
                    self.root = Some(node);
                }
            }
            Some(Frame::Sequence(_, _, items)) => items.push(node),
            Some(Frame::Mapping(_, _, entries, pending_key)) => match pending_key.take() {
                None => *pending_key = Some(node),
                Some(key) => entries.push((key, node)),
            },
        }
    }
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        match ev {
            Event::Scalar(value, _, anchor_id, _) => self.push_anchored(
                anchor_id,
                Node {
                    start: mark.index(),
                    kind: NodeKind::Scalar(value),
                },
            ),
            // Aliases expand to the anchored node, positioned at the alias itself.
            Event::Alias(anchor_id) => {
                let kind = self
                    .anchors
                    .get(&anchor_id)
                    .map_or(NodeKind::Alias, |node| node.kind.clone());
                self.push_node(Node {
                    start: mark.index(),
                    kind,
                });
            }
            Event::SequenceStart(anchor_id, _) => {
                self.stack
                    .push(Frame::Sequence(mark.index(), anchor_id, Vec::new()))
            }
            Event::MappingStart(anchor_id, _) => {
                self.stack
                    .push(Frame::Mapping(mark.index(), anchor_id, Vec::new(), None))
            }
            Event::SequenceEnd | Event::MappingEnd => {
                let (anchor_id, node) = match self.stack.pop() {
                    Some(Frame::Sequence(start, anchor_id, items)) => (
                        anchor_id,
                        Node {
                            start,
                            kind: NodeKind::Sequence(items),
                        },
                    ),
                    Some(Frame::Mapping(start, anchor_id, entries, _)) => (
                        anchor_id,
                        Node {
                            start,
                            kind: NodeKind::Mapping(entries),
                        },
                    ),
                    None => return,
                };
                self.push_anchored(anchor_id, node);
            }
            _ => {}
        }
    }
}
