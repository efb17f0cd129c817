//! Basic blocks and the control-flow graph
//!
//! Blocks are arena-owned by the CFG of the definition being translated and
//! referenced by `BlockId`. A block has at most two successors: `jump[1]`
//! is taken when the block's outgoing value is true, `jump[0]` is the
//! unconditional or fallthrough edge. A block with neither is terminal, or
//! an orphan introduced after `break`, `continue` or `return`.

use crate::ir::{Instruction, Var};
use qcc_common::{BlockId, SymbolId};
use serde::{Deserialize, Serialize};

/// A maximal straight-line IR sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub code: Vec<Instruction>,
    /// Value the block leaves behind for its consumer (branch condition,
    /// sub-expression result)
    pub expr: Option<Var>,
    /// jump[0] = false/unconditional edge, jump[1] = true edge
    pub jump: [Option<BlockId>; 2],
}

impl Block {
    fn new(id: BlockId) -> Self {
        Self {
            id,
            code: Vec::new(),
            expr: None,
            jump: [None, None],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

/// Control-flow graph for one external definition
///
/// `head` collects load-time initialization (file-scope and static
/// objects); `body` is the entry of the function being defined, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cfg {
    /// Function symbol under definition, none for object initializers
    pub fun: Option<SymbolId>,
    pub head: BlockId,
    pub body: BlockId,
    pub params: Vec<SymbolId>,
    pub locals: Vec<SymbolId>,
    blocks: Vec<Block>,
}

impl Cfg {
    pub fn new() -> Self {
        let mut cfg = Self {
            fun: None,
            head: 0,
            body: 0,
            params: Vec::new(),
            locals: Vec::new(),
            blocks: Vec::new(),
        };
        cfg.head = cfg.new_block();
        cfg.body = cfg.new_block();
        cfg
    }

    pub fn new_block(&mut self) -> BlockId {
        let id = self.blocks.len() as BlockId;
        self.blocks.push(Block::new(id));
        id
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id as usize]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id as usize]
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn emit(&mut self, block: BlockId, instruction: Instruction) {
        self.block_mut(block).code.push(instruction);
    }

    pub fn expr(&self, block: BlockId) -> Option<Var> {
        self.block(block).expr.clone()
    }

    pub fn set_expr(&mut self, block: BlockId, value: Var) {
        self.block_mut(block).expr = Some(value);
    }

    pub fn register_param(&mut self, sym: SymbolId) {
        self.params.push(sym);
    }

    pub fn register_local(&mut self, sym: SymbolId) {
        self.locals.push(sym);
    }

    /// Entry of the load-time initialization chain. `head` is the cursor
    /// declarations append to; it moves past the entry when an initializer
    /// introduces control flow.
    pub fn init_entry(&self) -> BlockId {
        0
    }

    /// True when this CFG carries something to emit: a function body or
    /// load-time initialization code.
    pub fn has_output(&self) -> bool {
        self.fun.is_some()
            || self.head != self.init_entry()
            || !self.block(self.init_entry()).is_empty()
    }

    /// Blocks reachable from the given entry
    pub fn reachable_from(&self, entry: BlockId) -> Vec<BlockId> {
        let mut seen = vec![false; self.blocks.len()];
        let mut stack = vec![entry];
        let mut order = Vec::new();
        while let Some(id) = stack.pop() {
            if seen[id as usize] {
                continue;
            }
            seen[id as usize] = true;
            order.push(id);
            for target in self.block(id).jump.iter().rev().flatten() {
                stack.push(*target);
            }
        }
        order
    }
}

impl Default for Cfg {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_and_body_allocated() {
        let cfg = Cfg::new();
        assert_ne!(cfg.head, cfg.body);
        assert!(cfg.block(cfg.head).is_empty());
        assert!(!cfg.has_output());
    }

    #[test]
    fn test_reachability() {
        let mut cfg = Cfg::new();
        let a = cfg.new_block();
        let b = cfg.new_block();
        let orphan = cfg.new_block();
        cfg.block_mut(cfg.body).jump[0] = Some(a);
        cfg.block_mut(a).jump[0] = Some(b);
        cfg.block_mut(a).jump[1] = Some(cfg.body);

        let reachable = cfg.reachable_from(cfg.body);
        assert!(reachable.contains(&a));
        assert!(reachable.contains(&b));
        assert!(!reachable.contains(&orphan));
    }
}
