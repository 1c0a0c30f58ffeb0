//! Function layout: block order and instruction order within blocks.
use cranelift_entity::SecondaryMap;

use crate::{dfg::BlockId, inst::InstId};

#[derive(Debug, Default)]
pub struct Layout {
    blocks: SecondaryMap<BlockId, BlockNode>,
    insts: SecondaryMap<InstId, InstNode>,
    entry_block: Option<BlockId>,
    last_block: Option<BlockId>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry_block(&self) -> Option<BlockId> {
        self.entry_block
    }

    pub fn is_block_inserted(&self, block: BlockId) -> bool {
        Some(block) == self.entry_block || self.blocks[block] != BlockNode::default()
    }

    pub fn first_inst_of(&self, block: BlockId) -> Option<InstId> {
        debug_assert!(self.is_block_inserted(block));
        self.blocks[block].first_inst
    }

    pub fn last_inst_of(&self, block: BlockId) -> Option<InstId> {
        debug_assert!(self.is_block_inserted(block));
        self.blocks[block].last_inst
    }

    pub fn inst_block(&self, inst: InstId) -> BlockId {
        debug_assert!(self.is_inst_inserted(inst));
        self.insts[inst].block.unwrap()
    }

    pub fn is_inst_inserted(&self, inst: InstId) -> bool {
        self.insts[inst] != InstNode::default()
    }

    pub fn iter_block(&self) -> impl Iterator<Item = BlockId> + '_ {
        BlockIter {
            next: self.entry_block,
            blocks: &self.blocks,
        }
    }

    pub fn iter_inst(&self, block: BlockId) -> impl Iterator<Item = InstId> + '_ {
        debug_assert!(self.is_block_inserted(block));
        InstIter {
            next: self.blocks[block].first_inst,
            insts: &self.insts,
        }
    }

    pub fn append_block(&mut self, block: BlockId) {
        debug_assert!(!self.is_block_inserted(block));

        let mut block_node = BlockNode::default();

        if let Some(last_block) = self.last_block {
            self.blocks[last_block].next = Some(block);
            block_node.prev = Some(last_block);
        } else {
            self.entry_block = Some(block);
        }

        self.blocks[block] = block_node;
        self.last_block = Some(block);
    }

    pub fn append_inst(&mut self, inst: InstId, block: BlockId) {
        debug_assert!(self.is_block_inserted(block));
        debug_assert!(!self.is_inst_inserted(inst));

        let mut inst_node = InstNode {
            block: Some(block),
            ..InstNode::default()
        };

        if let Some(last_inst) = self.blocks[block].last_inst {
            self.insts[last_inst].next = Some(inst);
            inst_node.prev = Some(last_inst);
        } else {
            self.blocks[block].first_inst = Some(inst);
        }

        self.insts[inst] = inst_node;
        self.blocks[block].last_inst = Some(inst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct BlockNode {
    prev: Option<BlockId>,
    next: Option<BlockId>,
    first_inst: Option<InstId>,
    last_inst: Option<InstId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct InstNode {
    block: Option<BlockId>,
    prev: Option<InstId>,
    next: Option<InstId>,
}

struct BlockIter<'a> {
    next: Option<BlockId>,
    blocks: &'a SecondaryMap<BlockId, BlockNode>,
}

impl Iterator for BlockIter<'_> {
    type Item = BlockId;

    fn next(&mut self) -> Option<BlockId> {
        let block = self.next?;
        self.next = self.blocks[block].next;
        Some(block)
    }
}

struct InstIter<'a> {
    next: Option<InstId>,
    insts: &'a SecondaryMap<InstId, InstNode>,
}

impl Iterator for InstIter<'_> {
    type Item = InstId;

    fn next(&mut self) -> Option<InstId> {
        let inst = self.next?;
        self.next = self.insts[inst].next;
        Some(inst)
    }
}
