//! Shared bucket hash for the profile and JIT tables.
//!
//! A direct port of the source material's `dvmJitHash`: shift off the
//! low alignment bits, mix in the high bits, mask to capacity. Any
//! distribution works as long as every table uses the same one and
//! `mod capacity` is taken at the call site.

use crate::pc::Pc;

pub(crate) fn bucket_index(pc: Pc, capacity: usize) -> usize {
    let shifted = pc.0 >> 2;
    (shifted ^ (shifted >> 7)) % capacity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collides_on_multiples_of_capacity_shifted() {
        let capacity = 512;
        let a = Pc(0x1000);
        let b = Pc(a.0 + capacity * 4);
        assert_eq!(bucket_index(a, capacity), bucket_index(b, capacity));
    }
}
