use std::{fs::File, io::BufReader, io::BufWriter, path::Path};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    utils::{get_bin_edges, get_bin_index},
    GenKineError, GenKineResult,
};

/// An evenly-binned histogram axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    /// Number of bins.
    pub bins: usize,
    /// Lower edge.
    pub min: f64,
    /// Upper edge.
    pub max: f64,
    /// Axis title.
    pub title: String,
    /// Optional bin labels, one per bin.
    pub labels: Vec<String>,
}

impl Axis {
    /// An untitled axis with `bins` bins over `[min, max)`.
    pub fn new(bins: usize, min: f64, max: f64) -> Self {
        Self {
            bins,
            min,
            max,
            title: String::new(),
            labels: Vec::new(),
        }
    }

    /// Set the axis title.
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Set one label per bin.
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    /// The bin holding `value`, if it is in range.
    pub fn index(&self, value: f64) -> Option<usize> {
        get_bin_index(value, self.bins, (self.min, self.max))
    }

    /// Bin edges, one more than the number of bins.
    pub fn edges(&self) -> Vec<f64> {
        get_bin_edges(self.bins, (self.min, self.max))
    }
}

/// A one-dimensional histogram.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Histogram1D {
    /// Registry name.
    pub name: String,
    /// Title.
    pub title: String,
    /// The binned axis.
    pub x: Axis,
    /// Weighted counts per bin.
    pub counts: Vec<f64>,
    /// Weight which fell below the axis.
    pub underflow: f64,
    /// Weight which fell above the axis.
    pub overflow: f64,
    /// Number of fills.
    pub entries: usize,
}

impl Histogram1D {
    /// An empty histogram.
    pub fn new(name: &str, title: &str, x: Axis) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            counts: vec![0.0; x.bins],
            x,
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
        }
    }

    /// Add a unit weight at `x`.
    pub fn fill(&mut self, x: f64) {
        self.fill_weighted(x, 1.0);
    }

    /// Add `weight` at `x`.
    pub fn fill_weighted(&mut self, x: f64, weight: f64) {
        self.entries += 1;
        match self.x.index(x) {
            Some(i) => self.counts[i] += weight,
            None if x < self.x.min => self.underflow += weight,
            None => self.overflow += weight,
        }
    }

    /// Content of the bin holding `x`, zero out of range.
    pub fn content_at(&self, x: f64) -> f64 {
        self.x.index(x).map_or(0.0, |i| self.counts[i])
    }

    /// Sum of the in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.counts.iter().sum()
    }
}

/// A two-dimensional histogram. Counts are stored row-major along `x`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Histogram2D {
    /// Registry name.
    pub name: String,
    /// Title.
    pub title: String,
    /// The first binned axis.
    pub x: Axis,
    /// The second binned axis.
    pub y: Axis,
    /// Weighted counts, `counts[ix * y.bins + iy]`.
    pub counts: Vec<f64>,
    /// Weight which fell outside either axis.
    pub out_of_range: f64,
    /// Number of fills.
    pub entries: usize,
}

impl Histogram2D {
    /// An empty histogram.
    pub fn new(name: &str, title: &str, x: Axis, y: Axis) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            counts: vec![0.0; x.bins * y.bins],
            x,
            y,
            out_of_range: 0.0,
            entries: 0,
        }
    }

    /// Add a unit weight at `(x, y)`.
    pub fn fill(&mut self, x: f64, y: f64) {
        self.fill_weighted(x, y, 1.0);
    }

    /// Add `weight` at `(x, y)`.
    pub fn fill_weighted(&mut self, x: f64, y: f64, weight: f64) {
        self.entries += 1;
        match (self.x.index(x), self.y.index(y)) {
            (Some(ix), Some(iy)) => self.counts[ix * self.y.bins + iy] += weight,
            _ => self.out_of_range += weight,
        }
    }

    /// Content of the bin holding `(x, y)`, zero out of range.
    pub fn content_at(&self, x: f64, y: f64) -> f64 {
        match (self.x.index(x), self.y.index(y)) {
            (Some(ix), Some(iy)) => self.counts[ix * self.y.bins + iy],
            _ => 0.0,
        }
    }

    /// Sum of the in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Sum over `x` of the contents, one value per `y` bin.
    pub fn projection_y(&self) -> Vec<f64> {
        let mut projection = vec![0.0; self.y.bins];
        for (i, count) in self.counts.iter().enumerate() {
            projection[i % self.y.bins] += count;
        }
        projection
    }
}

/// Either kind of histogram.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Histogram {
    /// A one-dimensional histogram.
    OneD(Histogram1D),
    /// A two-dimensional histogram.
    TwoD(Histogram2D),
}

impl Histogram {
    /// Registry name.
    pub fn name(&self) -> &str {
        match self {
            Histogram::OneD(h) => &h.name,
            Histogram::TwoD(h) => &h.name,
        }
    }

    /// Number of fills.
    pub fn entries(&self) -> usize {
        match self {
            Histogram::OneD(h) => h.entries,
            Histogram::TwoD(h) => h.entries,
        }
    }
}

/// A handle to a booked [`Histogram1D`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Hist1DID(usize);

/// A handle to a booked [`Histogram2D`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Hist2DID(usize);

/// An ordered collection of histograms addressed by name or by the handle returned at booking.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramRegistry {
    prefix: String,
    histograms: IndexMap<String, Histogram>,
}

impl HistogramRegistry {
    /// An empty registry whose histogram names all start with `prefix`.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            histograms: IndexMap::new(),
        }
    }

    /// The name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn book(&mut self, histogram: Histogram) -> GenKineResult<usize> {
        let name = histogram.name().to_string();
        if self.histograms.contains_key(&name) {
            return Err(GenKineError::RegistrationError { name });
        }
        let (index, _) = self.histograms.insert_full(name, histogram);
        Ok(index)
    }

    /// Book a [`Histogram1D`] named `prefix + name`.
    ///
    /// # Errors
    ///
    /// Returns [`GenKineError::RegistrationError`] if the name is taken.
    pub fn book_1d(&mut self, name: &str, title: &str, x: Axis) -> GenKineResult<Hist1DID> {
        let full_name = format!("{}{}", self.prefix, name);
        let index = self.book(Histogram::OneD(Histogram1D::new(&full_name, title, x)))?;
        Ok(Hist1DID(index))
    }

    /// Book a [`Histogram2D`] named `prefix + name`.
    ///
    /// # Errors
    ///
    /// Returns [`GenKineError::RegistrationError`] if the name is taken.
    pub fn book_2d(
        &mut self,
        name: &str,
        title: &str,
        x: Axis,
        y: Axis,
    ) -> GenKineResult<Hist2DID> {
        let full_name = format!("{}{}", self.prefix, name);
        let index = self.book(Histogram::TwoD(Histogram2D::new(&full_name, title, x, y)))?;
        Ok(Hist2DID(index))
    }

    /// Fill a booked [`Histogram1D`].
    pub fn fill_1d(&mut self, id: Hist1DID, x: f64) {
        if let Some((_, Histogram::OneD(h))) = self.histograms.get_index_mut(id.0) {
            h.fill(x);
        }
    }

    /// Fill a booked [`Histogram2D`].
    pub fn fill_2d(&mut self, id: Hist2DID, x: f64, y: f64) {
        if let Some((_, Histogram::TwoD(h))) = self.histograms.get_index_mut(id.0) {
            h.fill(x, y);
        }
    }

    /// Look up a histogram by its full name.
    pub fn get(&self, name: &str) -> Option<&Histogram> {
        self.histograms.get(name)
    }

    /// Look up a [`Histogram1D`] by its name without the prefix.
    pub fn get_1d(&self, name: &str) -> Option<&Histogram1D> {
        match self.get(&format!("{}{}", self.prefix, name)) {
            Some(Histogram::OneD(h)) => Some(h),
            _ => None,
        }
    }

    /// Look up a [`Histogram2D`] by its name without the prefix.
    pub fn get_2d(&self, name: &str) -> Option<&Histogram2D> {
        match self.get(&format!("{}{}", self.prefix, name)) {
            Some(Histogram::TwoD(h)) => Some(h),
            _ => None,
        }
    }

    /// Iterate over all histograms in booking order.
    pub fn iter(&self) -> impl Iterator<Item = &Histogram> {
        self.histograms.values()
    }

    /// Number of booked histograms.
    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    /// Whether nothing is booked.
    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    /// Total number of fills over all histograms.
    pub fn total_entries(&self) -> usize {
        self.iter().map(Histogram::entries).sum()
    }

    /// Write the registry with `bincode`. The path may contain `~` and environment variables.
    pub fn save_as(&self, file_path: &str) -> GenKineResult<()> {
        let expanded_path = shellexpand::full(file_path)?;
        let file = File::create(Path::new(expanded_path.as_ref()))?;
        bincode::serialize_into(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Read a registry written by [`HistogramRegistry::save_as`].
    pub fn load_from(file_path: &str) -> GenKineResult<Self> {
        let expanded_path = shellexpand::full(file_path)?;
        let file = File::open(Path::new(expanded_path.as_ref()))?;
        Ok(bincode::deserialize_from(BufReader::new(file))?)
    }
}
