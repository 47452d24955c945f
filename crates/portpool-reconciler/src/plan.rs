// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turning panel entries into registry updates.

use std::collections::BTreeMap;

use portpool_core::{normalize, NumberUpdate, PanelEntry, UNKNOWN};

/// Map one panel entry to a registry update.
///
/// `None` for entries without an inserted SIM, or whose serial number does
/// not normalize to a number.
pub fn entry_to_update(entry: &PanelEntry, dial_code: u32) -> Option<NumberUpdate> {
    if !entry.is_valid() {
        return None;
    }
    let number = normalize(entry.sn.as_deref()?, dial_code).as_i64()?;
    let active = entry.is_active();
    Some(NumberUpdate {
        number,
        port: entry.port.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        iccid: entry.iccid.clone(),
        imsi: entry.imsi.clone(),
        operator: entry.opr.clone(),
        signal: if active { entry.sig.unwrap_or(0).max(0) } else { 0 },
        active,
        locked: entry.is_locked(),
    })
}

/// Merge every panel's entries into one update per canonical number.
///
/// Panels are applied in order and entries within a panel in order, so the
/// last report of a number in the sweep wins. The result is sorted by number.
pub fn plan_sweep<'a, I>(panels: I, dial_code: u32) -> Vec<NumberUpdate>
where
    I: IntoIterator<Item = &'a [PanelEntry]>,
{
    let mut merged = BTreeMap::new();
    for entries in panels {
        for update in entries.iter().filter_map(|e| entry_to_update(e, dial_code)) {
            merged.insert(update.number, update);
        }
    }
    merged.into_values().collect()
}
