// Species identifier candidates used to find a creature in the ranking lists.
//
// Ranking ids look like "marowak_alolan_shadow". Creature records carry a
// game-master form token such as "MAROWAK_ALOLA", so we derive a base id from
// the form and try progressively looser candidates.

/// Species whose names contain an underscore in form tokens.
const MULTI_WORD_SPECIES: [(&str, &str); 3] = [
    ("MR_MIME_", "mr_mime"),
    ("HO_OH_", "ho_oh"),
    ("PORYGON_Z_", "porygon_z"),
];

/// Region markers in form tokens and the adjective used by ranking ids.
const REGIONAL_FORMS: [(&str, &str); 4] = [
    ("ALOLA", "alolan"),
    ("GALAR", "galarian"),
    ("HISUI", "hisuian"),
    ("PALDEA", "paldean"),
];

/// Display names whose slug is not just the lowercased name.
const NAME_ALIASES: [(&str, &str); 7] = [
    ("mr. mime", "mr_mime"),
    ("mime jr.", "mime_jr"),
    ("mr. rime", "mr_rime"),
    ("farfetch'd", "farfetchd"),
    ("sirfetch'd", "sirfetchd"),
    ("type: null", "type_null"),
    ("flabébé", "flabebe"),
];

fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            '\u{2019}' => '\'',
            other => other,
        })
        .collect()
}

/// Lowercase hyphenated slug of a display name ("Ho-Oh" -> "ho-oh",
/// "Farfetch'd" -> "farfetchd").
pub fn slugify_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    if let Some((_, alias)) = NAME_ALIASES.iter().find(|(n, _)| *n == lowered) {
        return (*alias).to_string();
    }
    let plain = fold_accents(&lowered);
    if let Some((_, alias)) = NAME_ALIASES.iter().find(|(n, _)| fold_accents(n) == plain) {
        return (*alias).to_string();
    }
    plain
        .replace(['.', '\''], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Base ranking id for a species. `form` must already be uppercase.
fn base_identifier(form: &str, name: &str) -> String {
    if !form.is_empty() {
        if let Some((_, id)) = MULTI_WORD_SPECIES.iter().find(|(p, _)| form.starts_with(p)) {
            return (*id).to_string();
        }
        return form.split('_').next().unwrap_or_default().to_lowercase();
    }
    slugify_name(name).replace('-', "_")
}

fn regional_adjective(token: &str) -> String {
    REGIONAL_FORMS
        .iter()
        .find(|(marker, _)| *marker == token)
        .map(|(_, adjective)| (*adjective).to_string())
        .unwrap_or_else(|| token.to_lowercase())
}

/// Candidate ranking ids for a creature, most specific first.
///
/// 1. base id plus the form remainder ("rattata_alolan"), unless the
///    remainder is NORMAL
/// 2. base id plus a regional adjective when the form names a region
/// 3. the bare base id
///
/// Shadow creatures try every candidate with `_shadow` appended before any
/// plain candidate. Empty and duplicate ids are removed.
pub fn candidate_identifiers(form: Option<&str>, name: &str, shadow: bool) -> Vec<String> {
    let form = form.unwrap_or_default().trim().to_uppercase();
    let base = base_identifier(&form, name);

    let mut plain = Vec::new();
    if !form.is_empty() && !base.is_empty() {
        let marker = format!("{}_", base.to_uppercase());
        if let Some(remainder) = form.strip_prefix(&marker) {
            if !remainder.is_empty() && remainder != "NORMAL" {
                let suffix: Vec<String> = remainder
                    .split('_')
                    .filter(|t| !t.is_empty())
                    .map(regional_adjective)
                    .collect();
                if !suffix.is_empty() {
                    plain.push(format!("{base}_{}", suffix.join("_")));
                }
            }
        }
    }
    for (marker, adjective) in REGIONAL_FORMS {
        if form.contains(marker) {
            plain.push(format!("{base}_{adjective}"));
        }
    }
    plain.push(base);

    let ordered: Vec<String> = if shadow {
        plain
            .iter()
            .map(|c| format!("{c}_shadow"))
            .chain(plain.iter().cloned())
            .collect()
    } else {
        plain
    };

    let mut seen = std::collections::HashSet::new();
    ordered
        .into_iter()
        .filter(|c| !c.is_empty() && !c.starts_with('_') && seen.insert(c.clone()))
        .collect()
}
