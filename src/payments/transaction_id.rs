use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;

const PREFIX: &str = "TXN";
const RANDOM_BYTES: usize = 8;

/// Build a new transaction id: `TXN` + base-36 millisecond timestamp +
/// 16 upper-case hex digits from the OS CSPRNG.
pub fn generate_transaction_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;

    let mut entropy = [0u8; RANDOM_BYTES];
    OsRng.fill_bytes(&mut entropy);

    format!(
        "{}{}{}",
        PREFIX,
        to_base36(millis),
        hex::encode_upper(entropy)
    )
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}
