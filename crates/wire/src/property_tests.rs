// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Framing invariants that should hold for any payload, not just the
//! hand-picked examples in `wire_tests.rs`.

use crate::{read_message, write_message};
use proptest::prelude::*;

proptest! {
    #[test]
    fn length_prefixed_framing_round_trips_for_any_payload(payload in prop::collection::vec(any::<u8>(), 0..4096)) {
        let rt = tokio::runtime::Runtime::new().expect("runtime");
        rt.block_on(async {
            let mut buffer = Vec::new();
            write_message(&mut buffer, &payload).await.expect("write failed");
            prop_assert_eq!(buffer.len(), 4 + payload.len());

            let mut cursor = std::io::Cursor::new(buffer);
            let read_back = read_message(&mut cursor).await.expect("read failed");
            prop_assert_eq!(read_back, payload);
            Ok(())
        })?;
    }
}
