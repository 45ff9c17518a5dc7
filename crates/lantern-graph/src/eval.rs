//! Frame-memoized pull evaluation.
//!
//! An output's compute function runs at most once per frame. Pulling an
//! input evaluates the output feeding it, which in turn pulls its own
//! inputs, so a diamond of shared ancestors evaluates each once.

use lantern_core::{FrameId, Signal};

use crate::scene::Scene;

/// Input access handed to [`NodeBehavior::compute`](crate::NodeBehavior::compute).
pub struct Pull<'a> {
    scene: &'a mut Scene,
    node: usize,
}

impl Pull<'_> {
    /// The frame being evaluated.
    pub fn frame(&self) -> FrameId {
        self.scene.frame
    }

    /// The value arriving at the node's `n`th input, in creation order.
    ///
    /// A disconnected or missing input reads as [`Signal::Empty`].
    pub fn input(&mut self, n: usize) -> Signal {
        let connection = self
            .scene
            .nodes
            .get(self.node)
            .and_then(|node| node.inputs.get(n).copied())
            .and_then(|input| self.scene.inputs.get(input))
            .and_then(|input| input.connection);
        match connection {
            Some(output) => self.scene.eval_output(output),
            None => Signal::Empty,
        }
    }

    /// Whether the node's `n`th input is connected.
    pub fn is_connected(&self, n: usize) -> bool {
        self.scene
            .nodes
            .get(self.node)
            .and_then(|node| node.inputs.get(n).copied())
            .and_then(|input| self.scene.inputs.get(input))
            .is_some_and(|input| input.connection.is_some())
    }
}

impl Scene {
    /// Move to the next frame, invalidating every cached output.
    pub fn advance_frame(&mut self) -> FrameId {
        self.frame = self.frame.next();
        self.frame
    }

    /// The value of output slot `idx` for the current frame.
    ///
    /// Computes at most once per frame. A disabled class yields
    /// [`Signal::Empty`]. Re-entering an output whose compute function is
    /// already on the stack returns its previous value.
    pub fn eval_output(&mut self, idx: usize) -> Signal {
        let frame = self.frame;
        let Some(slot) = self.outputs.get_mut(idx) else {
            return Signal::Empty;
        };
        if slot.last_frame == Some(frame) || slot.evaluating {
            return slot.value.clone();
        }
        let (node_idx, func) = (slot.node, slot.func);

        let Some(node) = self.nodes.get_mut(node_idx) else {
            return Signal::Empty;
        };
        let enabled = self.classes.get(node.class).is_some_and(|c| c.enabled);
        if !enabled {
            return Signal::Empty;
        }
        // Another output of this node is mid-compute.
        let Some(mut behavior) = node.behavior.take() else {
            return self
                .outputs
                .get(idx)
                .map(|s| s.value.clone())
                .unwrap_or_default();
        };

        if let Some(slot) = self.outputs.get_mut(idx) {
            slot.evaluating = true;
        }
        let value = behavior.compute(
            func,
            &mut Pull {
                scene: self,
                node: node_idx,
            },
        );
        if let Some(node) = self.nodes.get_mut(node_idx) {
            node.behavior = Some(behavior);
        }
        if let Some(slot) = self.outputs.get_mut(idx) {
            slot.evaluating = false;
            slot.last_frame = Some(frame);
            slot.value = value.clone();
        }
        value
    }

    /// The current-frame value of output `output`, traced through facades.
    pub fn evaluate(&mut self, output: lantern_core::OutputId) -> Signal {
        match self.trace_output(output) {
            Ok(idx) => self.eval_output(idx),
            Err(_) => Signal::Empty,
        }
    }
}
