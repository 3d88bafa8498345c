//! Node addressing
//!
//! The low 6 bits of every identifier carry the node, the bits above select
//! the message space. Bank bases are not sequential: bank 4 lives at 0x240,
//! between banks 0 and 1.

use crate::types::NodeId;

const NODE_MASK: u32 = 0x3F;
const SPACE_MASK: u32 = 0x7C0;

/// Heartbeat (node guarding) base id
pub const HEARTBEAT_BASE: u32 = 0x700;
/// Digital channel frame base id
pub const DIGITAL_BASE: u32 = 0x180;
/// Analog banks 0..=7, four channels each
pub const ANALOG_BANK_BASES: [u32; 8] = [0x200, 0x280, 0x300, 0x380, 0x240, 0x2C0, 0x340, 0x3C0];
/// Broadcast id of the time frame, never offset by a node
pub const TIME_SYNC_ID: u32 = 0x100;

/// Category of a frame, derived from its identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageSpace {
    Heartbeat,
    Digital,
    /// Analog bank 0..=7
    AnalogBank(u8),
}

impl MessageSpace {
    /// Base id of this space (node bits zero)
    pub fn base(self) -> u32 {
        match self {
            MessageSpace::Heartbeat => HEARTBEAT_BASE,
            MessageSpace::Digital => DIGITAL_BASE,
            MessageSpace::AnalogBank(bank) => ANALOG_BANK_BASES[bank as usize],
        }
    }
}

/// Identifier of `space_base` addressed to `node`.
pub fn compose(space_base: u32, node: NodeId) -> u32 {
    space_base + u32::from(node.get())
}

/// Classify an identifier. `None` means the frame is not ours.
pub fn classify(id: u32) -> Option<MessageSpace> {
    match id & SPACE_MASK {
        HEARTBEAT_BASE => Some(MessageSpace::Heartbeat),
        DIGITAL_BASE => Some(MessageSpace::Digital),
        space => ANALOG_BANK_BASES
            .iter()
            .position(|&base| base == space)
            .map(|bank| MessageSpace::AnalogBank(bank as u8)),
    }
}

/// True if the node bits of `id` equal `node`.
pub fn node_matches(id: u32, node: NodeId) -> bool {
    id & NODE_MASK == u32::from(node.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(n: u8) -> NodeId {
        NodeId::new(n).unwrap()
    }

    #[test]
    fn test_compose() {
        assert_eq!(compose(DIGITAL_BASE, node(1)), 0x181);
        assert_eq!(compose(HEARTBEAT_BASE, node(63)), 0x73F);
        assert_eq!(compose(ANALOG_BANK_BASES[4], node(2)), 0x242);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(0x701), Some(MessageSpace::Heartbeat));
        assert_eq!(classify(0x181), Some(MessageSpace::Digital));
        assert_eq!(classify(0x201), Some(MessageSpace::AnalogBank(0)));
        assert_eq!(classify(0x241), Some(MessageSpace::AnalogBank(4)));
        assert_eq!(classify(0x3FF), Some(MessageSpace::AnalogBank(7)));
        assert_eq!(classify(0x100), None);
        assert_eq!(classify(0x400), None);
        assert_eq!(classify(0x581), None);
    }

    #[test]
    fn test_classify_inverts_compose() {
        for n in 1..=63 {
            let n = node(n);
            for bank in 0..8u8 {
                let space = MessageSpace::AnalogBank(bank);
                assert_eq!(classify(compose(space.base(), n)), Some(space));
            }
            assert_eq!(classify(compose(DIGITAL_BASE, n)), Some(MessageSpace::Digital));
            assert_eq!(classify(compose(HEARTBEAT_BASE, n)), Some(MessageSpace::Heartbeat));
        }
    }

    #[test]
    fn test_node_matches() {
        assert!(node_matches(0x181, node(1)));
        assert!(!node_matches(0x182, node(1)));
        assert!(node_matches(0x73F, node(63)));
        // bit 6 belongs to the space, not the node
        assert!(node_matches(0x241, node(1)));
    }
}
