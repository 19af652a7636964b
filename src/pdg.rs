/// Photon.
pub const PHOTON: i32 = 22;
/// Gluon.
pub const GLUON: i32 = 21;
/// Neutral pion.
pub const PI0: i32 = 111;
/// Eta meson.
pub const ETA: i32 = 221;
/// Smallest nuclear code.
const NUCLEUS_MIN: u32 = 1_000_000_000;

/// Electric charge in units of $`e`$ for the particle with the given PDG code.
///
/// Antiparticles (negative codes) get the opposite charge. Nuclei (`±10LZZZAAAI`) carry their
/// proton number. Returns [`None`] for codes which are not in the table.
pub fn charge(pdg: i32) -> Option<f64> {
    let code = pdg.unsigned_abs();
    let q = match code {
        NUCLEUS_MIN.. => f64::from((code / 10_000) % 1000),
        // quarks
        1 | 3 | 5 => -1.0 / 3.0,
        2 | 4 | 6 => 2.0 / 3.0,
        // leptons
        11 | 13 | 15 => -1.0,
        12 | 14 | 16 => 0.0,
        // gauge and Higgs bosons
        21 | 22 | 23 | 25 => 0.0,
        24 => 1.0,
        // diquarks
        1103 | 3101 | 3103 | 3303 => -2.0 / 3.0,
        2101 | 2103 | 3201 | 3203 => 1.0 / 3.0,
        2203 => 4.0 / 3.0,
        // light mesons
        111 | 113 | 221 | 223 | 331 | 333 => 0.0,
        211 | 213 => 1.0,
        // strange mesons
        130 | 310 | 311 | 313 => 0.0,
        321 | 323 => 1.0,
        // heavy mesons
        421 | 443 | 511 | 531 | 553 => 0.0,
        411 | 431 | 521 => 1.0,
        // baryons
        2112 | 2114 | 3122 | 3212 | 3322 | 4132 => 0.0,
        2212 | 2214 | 3222 | 4122 | 4232 => 1.0,
        1114 | 3112 | 3312 | 3334 => -1.0,
        2224 | 4222 => 2.0,
        _ => return None,
    };
    Some(if pdg < 0 { -q } else { q })
}

/// Whether the code belongs to a photon-like neutral (a photon or a $`\pi^0`$).
pub fn is_photon_like(pdg: i32) -> bool {
    pdg == PHOTON || pdg == PI0
}
