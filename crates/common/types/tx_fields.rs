use crate::constants::{ACCESS_LIST_ADDRESS_COST, ACCESS_LIST_STORAGE_KEY_COST};
use crate::{Address, H256};
use serde::{Deserialize, Serialize};

pub type AccessList = Vec<AccessListItem>;
pub type AccessListItem = (Address, Vec<H256>);

/// RPC form of an access list entry.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AccessListEntry {
    pub address: Address,
    pub storage_keys: Vec<H256>,
}

impl From<&AccessListItem> for AccessListEntry {
    fn from(value: &AccessListItem) -> AccessListEntry {
        AccessListEntry {
            address: value.0,
            storage_keys: value.1.clone(),
        }
    }
}

impl From<&AccessListEntry> for AccessListItem {
    fn from(value: &AccessListEntry) -> AccessListItem {
        (value.address, value.storage_keys.clone())
    }
}

/// Intrinsic gas the list adds to its transaction: a flat charge per entry
/// plus a flat charge per storage key.
pub fn access_list_cost(access_list: &AccessList) -> u64 {
    access_list.iter().fold(0, |cost, (_, keys)| {
        cost.saturating_add(ACCESS_LIST_ADDRESS_COST)
            .saturating_add(ACCESS_LIST_STORAGE_KEY_COST.saturating_mul(keys.len() as u64))
    })
}
