//! Arbitration ID assignment derived from the two configured base IDs
//! (`ltk_st`, `stk_st`), grounded in
//! `master_core/can_comm_handler.py::CanCommunications.__init__`.
//!
//! The source carved a 50-ID range out of each base for one logical stream
//! and addressed frames within it by `id - base`; under the
//! single-ID-per-stream design a frame's role is positional, not derived
//! from its ID offset. The `+ 51` offset itself is unrelated to that
//! addressing redesign and is preserved unchanged: `self._ltk_sig_st =
//! self._ltk_pub_st + 50 + 1` in the source, confirmed by the spec's worked
//! example (`LTK_PUB_ST=0xFF100`, `LTK_SIG_ST=0xFF133`, delta `0x33` = 51).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanIds {
    pub ltk_pub: u32,
    pub ltk_sig: u32,
    pub stk: u32,
}

impl CanIds {
    pub fn from_base(ltk_st: u32, stk_st: u32) -> Self {
        Self {
            ltk_pub: ltk_st,
            ltk_sig: ltk_st + 51,
            stk: stk_st,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ltk_sig_follows_ltk_pub_by_51() {
        let ids = CanIds::from_base(0x0FF100, 0x0FF600);
        assert_eq!(ids.ltk_pub, 0x0FF100);
        assert_eq!(ids.ltk_sig, 0x0FF133);
        assert_eq!(ids.stk, 0x0FF600);
    }
}
