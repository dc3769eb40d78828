mod insert;
mod nodes;
mod path;
mod raw_tree;
mod remove;

pub(crate) use nodes::{Nodes, NodesMut};
pub(crate) use raw_tree::RawTree;
