//! Property test for the token bucket: however many times it's hit in a
//! tight burst, it never admits more than its configured capacity.

use jelly_room::session::TokenBucket;
use proptest::prelude::*;

proptest! {
    #[test]
    fn never_admits_more_than_capacity(capacity in 1u32..200, burst in 0usize..400) {
        let mut bucket = TokenBucket::new(capacity);
        let accepted = (0..burst).filter(|_| bucket.try_consume()).count();
        prop_assert!(accepted <= capacity as usize);
        prop_assert!(accepted <= burst);
    }
}
