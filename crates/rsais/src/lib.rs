#![doc = include_str!("../readme.md")]
pub mod decode;
pub mod nmea;

pub mod prelude {
    /// This re-export is necessary to decode messages
    pub use deku::prelude::*;

    pub use crate::decode::{
        BaseStationReport, ClassBPositionReport, LongRangePositionReport,
        PositionReport, StaticAndVoyageData, StaticDataReport,
    };
    /// The root structure to decode messages
    pub use crate::decode::Message;
    pub use crate::nmea::{Assembler, Sentence};
}
