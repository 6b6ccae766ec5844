//! Graphviz export of a node's view, for debugging.
//!
//! Vertices are labelled `data[*], chit, confidence`, where `*` marks the preferred
//! member of a contested conflict set and `?` stands for a chit of a transaction which
//! was not queried yet. Accepted vertices are filled. Edges point from child to parent.

use crate::avalanche::NodeSnapshot;
use crate::Result;

use std::fmt::Write as _;
use std::path::Path;

/// Renders the snapshot as a `dot` digraph.
pub fn render(snapshot: &NodeSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph G {{");
    for tx in snapshot.txs.iter() {
        let color = if tx.accepted { "color=lightblue; style=filled; " } else { "" };
        let pref = if tx.conflict_set_size > 1 && tx.preferred { "*" } else { "" };
        let chit = match tx.chit {
            Some(chit) => chit.to_string(),
            None => "?".to_owned(),
        };
        let _ = writeln!(
            out,
            "\"{}\" [{}label=\"{}{}, {}, {}\"];",
            tx.id, color, tx.data, pref, chit, tx.confidence
        );
    }
    for tx in snapshot.txs.iter() {
        for parent in tx.parents.iter() {
            let _ = writeln!(out, "\"{}\" -> \"{}\";", tx.id, parent);
        }
    }
    let _ = writeln!(out, "}}");
    out
}

pub fn write<P: AsRef<Path>>(path: P, snapshot: &NodeSnapshot) -> Result<()> {
    std::fs::write(path, render(snapshot))?;
    Ok(())
}
