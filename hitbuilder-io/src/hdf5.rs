//! HDF5 container backend.
//!
//! Each entry is a top-level group named after its key, carrying `class`,
//! `version` and `payload` string attributes plus an `order` index so entry
//! order survives the round trip.

use crate::container::{Entry, FORMAT_VERSION};
use crate::{Error, Result};
use hdf5::types::VarLenUnicode;
use hdf5::{File, Group};
use std::path::Path;

const FORMAT_ATTR: &str = "hitbuilder_format_version";

pub(crate) fn store_entries(path: &Path, entries: &[Entry]) -> Result<()> {
    let file = File::create(path)?;
    write_text(&file, FORMAT_ATTR, FORMAT_VERSION)?;
    for (index, entry) in entries.iter().enumerate() {
        write_entry(&file, index, entry)?;
    }
    Ok(())
}

pub(crate) fn load_entries(path: &Path) -> Result<Vec<Entry>> {
    let file = File::open(path)?;
    match read_text(&file, FORMAT_ATTR)? {
        Some(version) if version != FORMAT_VERSION => {
            return Err(Error::InvalidFormat(format!(
                "unsupported container format {version}"
            )));
        }
        _ => {}
    }

    let mut ordered = Vec::new();
    for key in file.member_names()? {
        if let Some(slot) = read_entry(&file.group(&key)?, key)? {
            ordered.push(slot);
        }
    }
    ordered.sort_by_key(|(order, _)| *order);
    Ok(ordered.into_iter().map(|(_, entry)| entry).collect())
}

fn write_entry(file: &File, index: usize, entry: &Entry) -> Result<()> {
    if entry.key.is_empty() || entry.key.contains('/') {
        return Err(Error::InvalidFormat(format!(
            "key {:?} is not a valid group name",
            entry.key
        )));
    }
    let order =
        u32::try_from(index).map_err(|_| Error::InvalidFormat("too many entries".to_string()))?;

    let group = file.create_group(&entry.key)?;
    write_text(&group, "class", &entry.class)?;
    write_text(&group, "version", &entry.version.to_string())?;
    write_text(&group, "payload", &entry.payload)?;
    group.new_attr::<u32>().create("order")?.write_scalar(&order)?;
    Ok(())
}

/// Reads the entry stored in `group` with its write position. Groups without
/// a `class` attribute were not written by this backend and are skipped.
fn read_entry(group: &Group, key: String) -> Result<Option<(u32, Entry)>> {
    let Some(class) = read_text(group, "class")? else {
        return Ok(None);
    };
    let version = read_text(group, "version")?
        .ok_or_else(|| Error::InvalidFormat(format!("entry {key} has no version")))?
        .parse::<u32>()
        .map_err(|e| Error::InvalidFormat(format!("entry {key} version: {e}")))?;
    let payload = read_text(group, "payload")?
        .ok_or_else(|| Error::InvalidFormat(format!("entry {key} has no payload")))?;
    let order = if has_attr(group, "order")? {
        group.attr("order")?.read_scalar::<u32>()?
    } else {
        u32::MAX
    };

    Ok(Some((
        order,
        Entry {
            key,
            class,
            version,
            payload,
        },
    )))
}

fn write_text(location: &Group, name: &str, value: &str) -> Result<()> {
    let value: VarLenUnicode = value
        .parse()
        .map_err(|e| Error::InvalidFormat(format!("attribute {name} is not valid text: {e}")))?;
    location
        .new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn read_text(location: &Group, name: &str) -> Result<Option<String>> {
    if !has_attr(location, name)? {
        return Ok(None);
    }
    let value: VarLenUnicode = location.attr(name)?.read_scalar()?;
    Ok(Some(value.as_str().to_string()))
}

fn has_attr(location: &Group, name: &str) -> Result<bool> {
    Ok(location.attr_names()?.iter().any(|n| n == name))
}
