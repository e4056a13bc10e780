//! The closed vocabulary of region names the extractor is able to recognise.

use indexmap::IndexSet;

use crate::gazetteer::Gazetteer;
use crate::normalize::normalize;
use crate::types::Level;

pub const PROVINCES: &[&str] = &[
    "dki jakarta",
    "jawa barat",
    "jawa tengah",
    "jawa timur",
    "bali",
    "sumatera utara",
    "sumatera barat",
    "sumatera selatan",
    "sumatera tengah",
    "sumatera timur",
    "kalimantan barat",
    "kalimantan tengah",
    "kalimantan selatan",
    "kalimantan timur",
    "kalimantan utara",
    "sulawesi utara",
    "sulawesi tengah",
    "sulawesi selatan",
    "sulawesi barat",
    "sulawesi tenggara",
    "papua",
    "maluku",
    "nusa tenggara barat",
    "nusa tenggara timur",
];

pub const REGENCIES_CITIES: &[&str] = &[
    "jakarta pusat",
    "jakarta selatan",
    "jakarta barat",
    "jakarta utara",
    "jakarta timur",
    "bogor",
    "bekasi",
    "bandung",
    "semarang",
    "solo",
    "surabaya",
    "malang",
    "medan",
    "padang",
    "denpasar",
    "buleleng",
];

pub const DISTRICTS: &[&str] = &[
    "tanah abang",
    "kebayoran baru",
    "grogol petamburan",
    "penjaringan",
    "cileungsi",
    "bekasi utara",
    "bandung wetan",
    "semarang tengah",
    "surabaya pusat",
    "medan petisah",
    "medan tuntungan",
    "padang utara",
    "padang selatan",
    "denpasar barat",
];

pub const VILLAGES: &[&str] = &[
    "sukamaju",
    "kebon melati",
    "kebon kacang",
    "selong",
    "gunung",
    "grogol",
    "pluit",
    "mampir",
    "cileungsi",
    "kranji",
    "kayu tinggi",
    "citarum",
    "pindrikan kidul",
    "pindrikan lor",
    "kemlayan",
    "serengan",
    "ketabang",
    "genteng",
    "klojen",
    "sukun",
    "kampung kajanan",
    "kampung baru",
    "pemecutan",
    "dauh puri",
    "petisah tengah",
    "petisah hulu",
    "tuntungan i",
    "tuntungan ii",
    "air tawar barat",
    "air tawar timur",
    "ranah",
    "seberang padang",
];

/// Known names per administrative level, normalised and deduplicated, in insertion order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lexicon {
    levels: [IndexSet<String>; 4],
}

impl Lexicon {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in Indonesian lexicon
    pub fn builtin() -> Self {
        let mut lexicon = Self::empty();
        for (level, names) in Level::ALL.into_iter().zip([PROVINCES, REGENCIES_CITIES, DISTRICTS, VILLAGES]) {
            for name in names {
                lexicon.add(level, name);
            }
        }
        lexicon
    }

    ///Adds a name, returns true if it was new. Blank names are ignored.
    pub fn add(&mut self, level: Level, name: &str) -> bool {
        let name = normalize(name);
        if name.is_empty() {
            return false;
        }
        self.levels[level.index()].insert(name)
    }

    /// Adds every non-empty name of every level found in the gazetteer
    pub fn extend_from_gazetteer(&mut self, gazetteer: &Gazetteer) -> usize {
        let mut added = 0;
        for level in Level::ALL {
            for key in gazetteer.index().keys(level) {
                if self.add(level, key) {
                    added += 1;
                }
            }
        }
        added
    }

    pub fn names(&self, level: Level) -> impl Iterator<Item = &str> {
        self.levels[level.index()].iter().map(|s| s.as_str())
    }

    pub fn contains(&self, level: Level, name: &str) -> bool {
        self.levels[level.index()].contains(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.levels.iter().map(|l| l.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
