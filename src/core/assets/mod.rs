mod asset_index;

pub use asset_index::{resolve_assets, AssetIndex, AssetObject, AssetSet, ResolvedAsset};
