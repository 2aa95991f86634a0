mod fund;
pub use self::fund::{
    AssetWeight, FundHistoryPoint, FundSectorAllocation, FundSnapshot, ReturnHorizon,
};
