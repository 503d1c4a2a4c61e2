//! Wire encoding for the zero-value self-transfer used as an anchor.
//!
//! Produces a legacy-format transaction: one signer (the payer, writable),
//! the System program as the only read-only account, and a single
//! `Transfer` instruction moving zero lamports from the payer to itself.

/// The System program id (32 zero bytes).
pub const SYSTEM_PROGRAM_ID: [u8; 32] = [0u8; 32];

/// System program instruction index for `Transfer`.
const SYSTEM_TRANSFER: u32 = 2;

/// Build the serialized message for a self-transfer of `lamports`.
pub fn self_transfer_message(payer: &[u8; 32], recent_blockhash: &[u8; 32], lamports: u64) -> Vec<u8> {
    let mut msg = Vec::with_capacity(3 + 1 + 64 + 32 + 20);

    // Header: required signatures, read-only signed, read-only unsigned.
    msg.extend_from_slice(&[1, 0, 1]);

    push_compact_u16(&mut msg, 2);
    msg.extend_from_slice(payer);
    msg.extend_from_slice(&SYSTEM_PROGRAM_ID);

    msg.extend_from_slice(recent_blockhash);

    push_compact_u16(&mut msg, 1);
    msg.push(1); // program id index
    push_compact_u16(&mut msg, 2);
    msg.extend_from_slice(&[0, 0]); // from = to = payer

    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&SYSTEM_TRANSFER.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());
    push_compact_u16(&mut msg, data.len() as u16);
    msg.extend_from_slice(&data);

    msg
}

/// Prefix a message with its single signature.
pub fn encode_transaction(signature: &[u8; 64], message: &[u8]) -> Vec<u8> {
    let mut tx = Vec::with_capacity(1 + 64 + message.len());
    push_compact_u16(&mut tx, 1);
    tx.extend_from_slice(signature);
    tx.extend_from_slice(message);
    tx
}

/// Variable-length u16: 7 bits per byte, high bit marks continuation.
fn push_compact_u16(buf: &mut Vec<u8>, mut value: u16) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        byte |= 0x80;
        buf.push(byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_u16() {
        let cases: [(u16, &[u8]); 5] = [
            (0, &[0x00]),
            (0x7f, &[0x7f]),
            (0x80, &[0x80, 0x01]),
            (0x3fff, &[0xff, 0x7f]),
            (0x4000, &[0x80, 0x80, 0x01]),
        ];
        for (value, expected) in cases {
            let mut buf = Vec::new();
            push_compact_u16(&mut buf, value);
            assert_eq!(buf, expected, "value {value:#x}");
        }
    }

    #[test]
    fn test_self_transfer_message_layout() {
        let payer = [7u8; 32];
        let blockhash = [9u8; 32];
        let msg = self_transfer_message(&payer, &blockhash, 0);

        assert_eq!(&msg[0..3], &[1, 0, 1]);
        assert_eq!(msg[3], 2);
        assert_eq!(&msg[4..36], &payer);
        assert_eq!(&msg[36..68], &SYSTEM_PROGRAM_ID);
        assert_eq!(&msg[68..100], &blockhash);
        // one instruction, program index 1, accounts [0, 0], 12 data bytes
        assert_eq!(&msg[100..106], &[1, 1, 2, 0, 0, 12]);
        assert_eq!(&msg[106..110], &2u32.to_le_bytes());
        assert_eq!(&msg[110..118], &0u64.to_le_bytes());
        assert_eq!(msg.len(), 118);
    }

    #[test]
    fn test_encode_transaction_prefixes_signature() {
        let sig = [3u8; 64];
        let tx = encode_transaction(&sig, b"msg");
        assert_eq!(tx[0], 1);
        assert_eq!(&tx[1..65], &sig);
        assert_eq!(&tx[65..], b"msg");
    }
}
