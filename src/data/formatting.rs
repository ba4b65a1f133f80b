//! Column tidying for geochemical tables.
//!
//! Tables coming off the database use inconsistent header casing (`sio2`,
//! `ZR`, `sample_id`). [`tidy_columns`] normalises headers to chemical
//! spelling and orders columns as: everything else, then major oxides, then
//! trace elements.

use super::CompositionTable;
use crate::error::Result;

/// Abbreviations kept upper case by [`titlecase`].
pub const ABBREVIATIONS: [&str; 2] = ["ID", "IGSN"];

/// Major-element oxides in conventional reporting order.
pub const COMMON_OXIDES: [&str; 18] = [
    "SiO2", "TiO2", "Al2O3", "Cr2O3", "Fe2O3", "FeO", "MnO", "NiO", "MgO", "CaO", "BaO", "SrO",
    "Na2O", "K2O", "P2O5", "SO3", "CO2", "H2O",
];

/// Element symbols in atomic-number order, hydrogen through uranium.
pub const COMMON_ELEMENTS: [&str; 92] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U",
];

/// Canonical spelling of an oxide or element header, matched
/// case-insensitively.
pub fn chem_name(name: &str) -> Option<&'static str> {
    let name = name.trim();
    COMMON_OXIDES
        .iter()
        .chain(COMMON_ELEMENTS.iter())
        .find(|known| known.eq_ignore_ascii_case(name))
        .copied()
}

/// Title-case a header word by word, keeping [`ABBREVIATIONS`] upper case.
///
/// Words are separated by spaces or underscores; separators are kept.
pub fn titlecase(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut word = String::new();
    for c in name.chars() {
        if c == '_' || c.is_whitespace() {
            out.push_str(&titlecase_word(&word));
            word.clear();
            out.push(c);
        } else {
            word.push(c);
        }
    }
    out.push_str(&titlecase_word(&word));
    out
}

fn titlecase_word(word: &str) -> String {
    if let Some(abbrv) = ABBREVIATIONS.iter().find(|a| a.eq_ignore_ascii_case(word)) {
        return abbrv.to_string();
    }
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Chemical spelling for oxides and elements, title case for anything else.
pub fn to_chem_case(name: &str) -> String {
    match chem_name(name) {
        Some(chem) => chem.to_string(),
        None => titlecase(name),
    }
}

/// Rename headers and reorder columns: others, then majors, then traces.
///
/// Majors follow [`COMMON_OXIDES`] order and traces follow atomic number;
/// everything else keeps its original relative order.
pub fn tidy_columns(table: &CompositionTable) -> Result<CompositionTable> {
    let renamed = table
        .rename_parts(to_chem_case)
        .with_index_label(&titlecase(table.index_label()));
    let ids = renamed.part_ids();

    let positions_of = |names: &[&str]| -> Vec<usize> {
        names
            .iter()
            .flat_map(|name| {
                ids.iter()
                    .enumerate()
                    .filter(move |(_, id)| id.as_str() == *name)
                    .map(|(j, _)| j)
            })
            .collect()
    };

    let majors = positions_of(&COMMON_OXIDES);
    let traces = positions_of(&COMMON_ELEMENTS);
    let mut order: Vec<usize> = (0..ids.len())
        .filter(|j| !majors.contains(j) && !traces.contains(j))
        .collect();
    order.extend(majors);
    order.extend(traces);

    renamed.select_indices(&order)
}
