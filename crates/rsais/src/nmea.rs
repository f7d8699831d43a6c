use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

/// Pending multi-fragment payloads are dropped after this many seconds.
/// A tail fragment lost on the radio side would otherwise pin its
/// predecessors in the table forever.
const REASSEMBLY_WINDOW_SEC: u64 = 30;

/// A single `!AIVDM`/`!AIVDO` sentence, after comma splitting and checksum
/// stripping.
///
/// ```text
/// !AIVDM,2,1,3,B,55P5TL01VIaAL@7WKO@mBplU@<PDhh000000001S;AJ::4A80?4i@E53,0*3E
///        | | | |                    payload                              | fill
///        count, number, sequence id, channel
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    pub fragment_count: u8,
    pub fragment_number: u8,
    pub sequence_id: Option<u8>,
    pub channel: Option<char>,
    pub payload: String,
    pub fill_bits: u8,
}

impl FromStr for Sentence {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if !line.starts_with("!AIVDM") && !line.starts_with("!AIVDO") {
            return Err("not an AIVDM/AIVDO sentence".to_string());
        }
        // The checksum is not verified: the feed is a local TCP stream, not
        // the radio itself.
        let line = match line.rsplit_once('*') {
            Some((head, _crc)) => head,
            None => line,
        };
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 7 {
            return Err(format!("expected 7 fields, got {}", fields.len()));
        }
        let fragment_count = fields[1]
            .parse::<u8>()
            .map_err(|_| "invalid fragment count".to_string())?;
        let fragment_number = fields[2]
            .parse::<u8>()
            .map_err(|_| "invalid fragment number".to_string())?;
        if fragment_count == 0 || fragment_number == 0 {
            return Err("fragment fields must be positive".to_string());
        }
        let sequence_id = fields[3].parse::<u8>().ok();
        let channel = fields[4].chars().next();
        let payload = fields[5].to_string();
        let fill_bits = fields[6]
            .parse::<u8>()
            .map_err(|_| "invalid fill bits".to_string())?;
        Ok(Sentence {
            fragment_count,
            fragment_number,
            sequence_id,
            channel,
            payload,
            fill_bits,
        })
    }
}

#[derive(Debug)]
struct Pending {
    fragment_count: u8,
    fragments: BTreeMap<u8, String>,
    /// Fill bits of the last fragment seen, which in a well-formed group is
    /// the final fragment (earlier fragments always fill their 6-bit slots).
    fill_bits: u8,
    first_seen: u64,
}

/// Reassembly of multi-fragment AIS payloads.
///
/// Fragments accumulate keyed by (sequence id, channel); the armored payload
/// is released once all fragments of a group have arrived, concatenated in
/// ascending fragment number.
#[derive(Debug, Default)]
pub struct Assembler {
    pending: BTreeMap<(u8, char), Pending>,
}

impl Assembler {
    /// Feed one line from the source. Returns `(payload, fill_bits)` when a
    /// complete armored payload is available, i.e. immediately for
    /// single-fragment sentences and on the closing fragment of a group.
    pub fn push(&mut self, line: &str, now: u64) -> Option<(String, u8)> {
        self.expire(now);
        let sentence = match Sentence::from_str(line) {
            Ok(sentence) => sentence,
            Err(reason) => {
                debug!("dropped line ({}): {}", reason, line.trim());
                return None;
            }
        };
        if sentence.fragment_count == 1 {
            if sentence.fragment_number != 1 {
                return None;
            }
            return Some((sentence.payload, sentence.fill_bits));
        }
        if sentence.fragment_number > sentence.fragment_count {
            return None;
        }
        let key = (
            sentence.sequence_id.unwrap_or(0),
            sentence.channel.unwrap_or(' '),
        );
        let pending = match self.pending.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(Pending {
                fragment_count: sentence.fragment_count,
                fragments: BTreeMap::new(),
                fill_bits: 0,
                first_seen: now,
            }),
        };
        pending.fill_bits = sentence.fill_bits;
        pending
            .fragments
            .insert(sentence.fragment_number, sentence.payload);
        if pending.fragments.len() == pending.fragment_count as usize {
            let pending = self.pending.remove(&key).unwrap();
            let payload =
                pending.fragments.into_values().collect::<Vec<_>>().concat();
            return Some((payload, pending.fill_bits));
        }
        None
    }

    fn expire(&mut self, now: u64) {
        self.pending.retain(|key, pending| {
            let keep = now < pending.first_seen + REASSEMBLY_WINDOW_SEC;
            if !keep {
                debug!("expired incomplete fragment group {:?}", key);
            }
            keep
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence() {
        let sentence = Sentence::from_str(
            "!AIVDM,1,1,,A,15M67FC000G?ufbE`abnoL0081P00,0*67",
        )
        .unwrap();
        assert_eq!(sentence.fragment_count, 1);
        assert_eq!(sentence.fragment_number, 1);
        assert_eq!(sentence.sequence_id, None);
        assert_eq!(sentence.channel, Some('A'));
        assert_eq!(sentence.payload, "15M67FC000G?ufbE`abnoL0081P00");
        assert_eq!(sentence.fill_bits, 0);

        assert!(Sentence::from_str("$GPGGA,123519,4807.038,N").is_err());
        assert!(Sentence::from_str("!AIVDM,1,1,,A").is_err());
        assert!(Sentence::from_str("!AIVDM,x,1,,A,15M67,0*67").is_err());
    }

    #[test]
    fn test_single_fragment() {
        let mut assembler = Assembler::default();
        let out = assembler
            .push("!AIVDM,1,1,,B,15M67FC000G?ufbE`abnoL0081P00,0*67", 0);
        assert_eq!(
            out,
            Some(("15M67FC000G?ufbE`abnoL0081P00".to_string(), 0))
        );
        assert!(assembler.pending.is_empty());
    }

    #[test]
    fn test_two_fragments() {
        let mut assembler = Assembler::default();
        assert_eq!(assembler.push("!AIVDM,2,1,3,B,55P5TL01VIaAL@7WKO,0*1C", 0), None);
        let out = assembler.push("!AIVDM,2,2,3,B,@mBplU@<PDhh00,2*0F", 1);
        assert_eq!(
            out,
            Some(("55P5TL01VIaAL@7WKO@mBplU@<PDhh00".to_string(), 2))
        );
        assert!(assembler.pending.is_empty());
    }

    #[test]
    fn test_fragments_out_of_order() {
        let mut assembler = Assembler::default();
        assert_eq!(assembler.push("!AIVDM,2,2,7,A,KKKK,4*0F", 0), None);
        let out = assembler.push("!AIVDM,2,1,7,A,JJJJ,0*1C", 1);
        assert_eq!(out, Some(("JJJJKKKK".to_string(), 4)));
    }

    #[test]
    fn test_interleaved_channels() {
        // Same sequence id on both channels must not cross-contaminate
        let mut assembler = Assembler::default();
        assert_eq!(assembler.push("!AIVDM,2,1,5,A,AAAA,0*00", 0), None);
        assert_eq!(assembler.push("!AIVDM,2,1,5,B,BBBB,0*00", 0), None);
        assert_eq!(
            assembler.push("!AIVDM,2,2,5,B,CCCC,2*00", 1),
            Some(("BBBBCCCC".to_string(), 2))
        );
        assert_eq!(
            assembler.push("!AIVDM,2,2,5,A,DDDD,2*00", 1),
            Some(("AAAADDDD".to_string(), 2))
        );
    }

    #[test]
    fn test_orphan_eviction() {
        let mut assembler = Assembler::default();
        assert_eq!(assembler.push("!AIVDM,2,1,1,A,AAAA,0*00", 0), None);
        // The closing fragment arrives too late: the group was evicted and
        // the lone tail never completes.
        assert_eq!(assembler.push("!AIVDM,2,2,1,A,BBBB,2*00", 31), None);
        assert_eq!(assembler.pending.len(), 1);
    }
}
