#[cfg(test)]
mod tests {
    use crate::encoder::{descriptor_leaf, encode_batch, encode_callback_region, EncodeError};
    use crate::mocks::{MockOracle, OracleError, PriceOracle, StaticAllowList, SubmitterAllowList};
    use crate::tree::AllowListTree;
    use alloy_primitives::{address, Address, B256, U256};
    use operator_vault_types::{
        CallbackAllowance, Clipboard, Descriptor, Operation, PinnedOffsets, ReturnMode,
    };

    fn descriptor(i: u8) -> Descriptor {
        Descriptor {
            target: Address::repeat_byte(i),
            selector: [i, 0, 0, 1],
            allows_value: i % 2 == 0,
            pinned_offsets: PinnedOffsets::new(&[0]).unwrap(),
            hook: None,
            callback: None,
            pinned_values: vec![i; 32],
        }
    }

    #[test]
    fn sha3_leaf_matches_descriptor_leaf() {
        let mut d = descriptor(3);
        d.hook = Some(address!("00000000000000000000000000000000000000ab"));
        d.callback =
            Some(CallbackAllowance { caller: d.target, selector: [9; 4], user_data_offset: 36 });
        assert_eq!(descriptor_leaf(&d), d.leaf());
    }

    #[test]
    fn every_leaf_proves_against_root() {
        for size in 1..=7u8 {
            let descriptors: Vec<Descriptor> = (1..=size).map(descriptor).collect();
            let tree = AllowListTree::from_descriptors(&descriptors);
            assert_eq!(tree.len(), size as usize);
            for (i, d) in descriptors.iter().enumerate() {
                let proof = tree.proof(i).unwrap();
                assert!(tree.verify(&proof, d.leaf()), "size {size} leaf {i}");
            }
            assert!(tree.proof(size as usize).is_none());
        }
    }

    #[test]
    fn single_leaf_tree_has_empty_proof() {
        let tree = AllowListTree::from_descriptors(&[descriptor(1)]);
        assert_eq!(tree.root(), descriptor(1).leaf());
        assert_eq!(tree.proof(0), Some(vec![]));
        assert_eq!(AllowListTree::from_leaves(vec![]).root(), B256::ZERO);
    }

    #[test]
    fn foreign_leaf_does_not_verify() {
        let tree = AllowListTree::from_descriptors(&[descriptor(1), descriptor(2)]);
        let proof = tree.proof(0).unwrap();
        assert!(!tree.verify(&proof, descriptor(3).leaf()));
    }

    #[test]
    fn batch_layout() {
        let mut op = Operation::call(Address::repeat_byte(1), vec![0xaa, 0xbb]);
        op.clipboards = vec![Clipboard::new(0, 1, 0x20)];
        op.value = U256::from(5u64);

        let encoded = encode_batch(&[op]).unwrap();
        // count + target + len + payload + clipboards + ro + cb + pinned + proof + hook + value
        let expected_len = 1 + 20 + 2 + 2 + (1 + 4) + 1 + 1 + 1 + 1 + 1 + (1 + 32);
        assert_eq!(encoded.len(), expected_len);
        assert_eq!(encoded[0], 1);
        assert_eq!(&encoded[21..23], &[0x00, 0x02]);
        assert_eq!(&encoded[26..30], &[0x00, 0x01, 0x00, 0x20]);
        assert_eq!(encoded[encoded.len() - 33], 1);
        assert_eq!(encoded[encoded.len() - 1], 5);
    }

    #[test]
    fn callback_region_length_prefix_covers_body() {
        let region = encode_callback_region(&ReturnMode::Static(vec![1, 2, 3]), &[]).unwrap();
        // len(2) | mode(1) | static len(2) + 3 | empty batch count(1)
        assert_eq!(region, vec![0x00, 0x07, 0x01, 0x00, 0x03, 1, 2, 3, 0x00]);

        let region = encode_callback_region(&ReturnMode::LastResult, &[]).unwrap();
        assert_eq!(region, vec![0x00, 0x02, 0x02, 0x00]);
    }

    #[test]
    fn oversized_fields_are_rejected_instead_of_truncated() {
        let op = Operation::call(Address::repeat_byte(1), vec![0u8; 65_540]);
        assert_eq!(
            encode_batch(&[op]),
            Err(EncodeError::TooLong { field: "payload length", len: 65_540, max: 65_535 })
        );

        let small = Operation::call(Address::repeat_byte(1), vec![]);
        let ops = vec![small.clone(); 256];
        assert!(matches!(
            encode_batch(&ops),
            Err(EncodeError::TooLong { field: "operation count", len: 256, .. })
        ));

        let mut many_clipboards = small.clone();
        many_clipboards.clipboards = vec![Clipboard::new(0, 0, 0); 256];
        assert!(matches!(
            encode_batch(&[many_clipboards]),
            Err(EncodeError::TooLong { field: "clipboard count", .. })
        ));

        let mut long_proof = small.clone();
        long_proof.proof = vec![B256::ZERO; 300];
        assert!(matches!(
            encode_batch(&[long_proof]),
            Err(EncodeError::TooLong { field: "proof length", .. })
        ));

        let region = encode_callback_region(&ReturnMode::Static(vec![0; 70_000]), &[]);
        assert!(matches!(
            region,
            Err(EncodeError::TooLong { field: "static return length", .. })
        ));
    }

    #[test]
    fn pinned_values_must_cover_every_offset() {
        let mut op = Operation::call(Address::repeat_byte(1), vec![0u8; 36]);
        op.pinned_offsets = PinnedOffsets::new(&[0, 32]).unwrap();
        op.pinned_values = vec![0u8; 32];
        assert_eq!(
            encode_batch(&[op]),
            Err(EncodeError::PinnedValuesLength { offsets: 2, expected: 64, actual: 32 })
        );
    }

    #[test]
    fn failed_operation_leaves_buffer_untouched() {
        let mut buf = vec![7u8];
        let op = Operation::call(Address::repeat_byte(1), vec![0u8; 65_536]);
        assert!(crate::encoder::encode_operation(&op, &mut buf).is_err());
        assert_eq!(buf, vec![7u8]);
    }

    #[test]
    fn mocks() {
        let allow = StaticAllowList::new([Address::repeat_byte(1)]);
        assert!(allow.is_allowed_submitter(Address::repeat_byte(1)));
        assert!(!allow.is_allowed_submitter(Address::repeat_byte(2)));

        let (weth, usdc) = (Address::repeat_byte(0xee), Address::repeat_byte(0xcc));
        let price = U256::from(2_000u64) * U256::from(10u64).pow(U256::from(18u64));
        let oracle = MockOracle::new().with_price(weth, usdc, price);
        assert_eq!(oracle.quote(U256::from(3u64), weth, usdc), Ok(U256::from(6_000u64)));
        assert_eq!(
            oracle.quote(U256::from(3u64), usdc, weth),
            Err(OracleError::UnsupportedPair { base: usdc, quote: weth })
        );
    }
}
