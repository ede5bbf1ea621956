//! Rule 110 lookup table for the bit-serial engine.

/// Next state indexed by the neighborhood `left << 2 | center << 1 | right`.
const RULE_110_TABLE: [bool; 8] = table_for(110);

const fn table_for(rule: u8) -> [bool; 8] {
    let mut table = [false; 8];
    let mut pattern: usize = 0;
    while pattern < 8 {
        table[pattern] = (rule >> pattern as u32) & 1 == 1;
        pattern += 1;
    }
    table
}

#[inline(always)]
pub(super) fn next_state(left: bool, center: bool, right: bool) -> bool {
    let pattern = ((left as usize) << 2) | ((center as usize) << 1) | right as usize;
    RULE_110_TABLE[pattern]
}
