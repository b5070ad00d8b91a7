//! Tree mutation primitives. Every operation validates its handles and
//! reports structural misuse as an error instead of panicking.

use super::Document;
use anyhow::{Result, anyhow, bail};
use indextree::{NodeError, NodeId};

fn tree_error(err: NodeError) -> anyhow::Error {
    anyhow!("tree update rejected: {err:?}")
}

impl Document {
    fn ensure_live(&self, id: NodeId) -> Result<()> {
        if self.node(id).is_none() {
            bail!("node {id:?} has been removed");
        }
        Ok(())
    }

    /// Insert `node` as a child of `parent`, before `reference` or at the
    /// end when `reference` is `None`. The node is detached from its current
    /// position first.
    ///
    /// # Errors
    /// Fails if a handle is stale, if `reference` is not a child of `parent`,
    /// or if the insertion would create a cycle.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        self.ensure_live(parent)?;
        self.ensure_live(node)?;
        if reference == Some(node) {
            return Ok(());
        }
        if self.contains(node, parent) {
            bail!("cannot insert a node into its own subtree");
        }
        if let Some(reference_node) = reference {
            if self.parent(reference_node) != Some(parent) {
                bail!("reference node is not a child of the target parent");
            }
        }
        node.detach(&mut self.arena);
        match reference {
            Some(reference_node) => reference_node
                .checked_insert_before(node, &mut self.arena)
                .map_err(tree_error),
            None => parent
                .checked_append(node, &mut self.arena)
                .map_err(tree_error),
        }
    }

    /// # Errors
    /// See [`Document::insert_before`].
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<()> {
        self.insert_before(parent, node, None)
    }

    /// Unlink a node (and its subtree) from the tree, keeping it alive.
    pub fn detach(&mut self, id: NodeId) {
        if self.node(id).is_some() {
            id.detach(&mut self.arena);
        }
    }

    /// Unlink and free a node and its subtree.
    pub fn remove(&mut self, id: NodeId) {
        if self.node(id).is_some() {
            id.remove_subtree(&mut self.arena);
        }
    }

    /// Put `replacement` where `old` is and free `old`.
    ///
    /// # Errors
    /// Fails if `old` has no parent or a handle is stale.
    pub fn replace_child(&mut self, old: NodeId, replacement: NodeId) -> Result<()> {
        let parent = self
            .parent(old)
            .ok_or_else(|| anyhow!("node to replace has no parent"))?;
        self.insert_before(parent, replacement, Some(old))?;
        self.remove(old);
        Ok(())
    }

    /// Free every child of `id`.
    pub fn remove_children(&mut self, id: NodeId) {
        for child in self.children(id) {
            self.remove(child);
        }
    }

    /// Copy a subtree, returning the detached copy.
    ///
    /// # Errors
    /// Fails if `id` has been removed.
    pub fn deep_clone(&mut self, id: NodeId) -> Result<NodeId> {
        let data = self
            .node(id)
            .cloned()
            .ok_or_else(|| anyhow!("cannot clone a removed node"))?;
        let copy = self.create_node(data);
        for child in self.children(id) {
            let child_copy = self.deep_clone(child)?;
            copy.checked_append(child_copy, &mut self.arena)
                .map_err(tree_error)?;
        }
        Ok(copy)
    }

    /// Replace an element's children with a single text node, or overwrite
    /// a text node's data. An empty string leaves the element childless.
    ///
    /// # Errors
    /// Fails if `id` has been removed.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<()> {
        self.ensure_live(id)?;
        if self.set_node_text(id, text) {
            return Ok(());
        }
        self.remove_children(id);
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.append_child(id, text_node)?;
        }
        Ok(())
    }
}
