//! Record harvester
//!
//! After a successful call, every non-null pointer in an output record is
//! either an alias of a caller-owned buffer (Triangle copies `holelist` and
//! `regionlist` straight from the input) or a block Triangle allocated.
//! Harvesting decides which, hands the latter to the record's ledger, and
//! copies the arrays into a `Triangulation`.
//!
//! Classification always runs before any copying, and is idempotent: a
//! second harvest of the same record adopts nothing new.

use crate::error::{Result, TriangleError};
use crate::ffi::{ArrayField, ElementKind};
use crate::geometry::{Region, Triangulation};
use crate::io::{RecordState, TriangleIo};
use crate::ledger::Ownership;
use std::os::raw::c_int;

/// Summary of one classification pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Classification {
    pub(crate) aliases: usize,
    pub(crate) adopted: usize,
    pub(crate) already_owned: usize,
}

impl TriangleIo {
    /// Classify output pointers and copy the results out
    ///
    /// `input` is the record this output was produced from; addresses backed
    /// by its managed buffers are treated as aliases.
    pub(crate) fn harvest(&mut self, input: &TriangleIo) -> Result<Triangulation> {
        match self.state {
            RecordState::Submitted | RecordState::Harvested => {}
            state => {
                return Err(TriangleError::Lifecycle {
                    operation: "harvest",
                    state,
                })
            }
        }

        let classification = self.classify(input);
        self.state = RecordState::Harvested;
        tracing::trace!(
            aliases = classification.aliases,
            adopted = classification.adopted,
            already_owned = classification.already_owned,
            "classified output record"
        );

        self.collect()
    }

    /// Run ownership classification over all pointer fields
    pub(crate) fn classify(&mut self, input: &TriangleIo) -> Classification {
        let mut managed = input.managed_addresses();
        managed.extend(self.managed_addresses());

        let mut summary = Classification::default();
        for field in ArrayField::ALL {
            let address = field.address(&self.raw);
            if address.is_null() {
                continue;
            }
            match self.ledger.adopt(address, &managed) {
                Ownership::Alias => summary.aliases += 1,
                Ownership::Native => summary.adopted += 1,
                Ownership::AlreadyOwned => summary.already_owned += 1,
            }
        }
        summary
    }

    /// `(rows, columns)` of a field, or `None` if its pointer is null
    pub(crate) fn shape(&self, field: ArrayField) -> Result<Option<(usize, usize)>> {
        let rows = field.raw_rows(&self.raw);
        let columns = field.raw_columns(&self.raw);
        if rows < 0 || columns < 0 {
            return Err(TriangleError::CorruptRecord {
                field: field.name(),
                reason: format!("negative shape {} x {}", rows, columns),
            });
        }
        let (rows, columns) = (rows as usize, columns as usize);

        if field.address(&self.raw).is_null() {
            // Triangle writes some counts (edges, hull segments, Voronoi
            // points) without the list unless the matching switch asks for it
            if rows > 0 && columns > 0 {
                tracing::trace!(field = field.name(), rows, "count without list");
            }
            return Ok(None);
        }
        Ok(Some((rows, columns)))
    }

    /// Borrow a floating-point field in place
    ///
    /// Output records are only reachable through a `Triangulator`, which
    /// also owns the input record any aliased field points into, so the
    /// borrow cannot outlive the data.
    pub fn real_field(&self, field: ArrayField) -> Result<&[f64]> {
        self.ensure_readable(field, ElementKind::Real)?;
        match self.shape(field)? {
            None => Ok(&[]),
            // Safety: the pointer is non-null, owned by this record, its
            // ledger, or the session's input record, and sized by the counts
            // the native routine wrote next to it.
            Some((rows, columns)) => Ok(unsafe {
                std::slice::from_raw_parts(field.address(&self.raw).cast::<f64>(), rows * columns)
            }),
        }
    }

    /// Borrow an integer field in place; see [`TriangleIo::real_field`]
    pub fn int_field(&self, field: ArrayField) -> Result<&[c_int]> {
        self.ensure_readable(field, ElementKind::Int)?;
        match self.shape(field)? {
            None => Ok(&[]),
            // Safety: as in `real_field`.
            Some((rows, columns)) => Ok(unsafe {
                std::slice::from_raw_parts(field.address(&self.raw).cast::<c_int>(), rows * columns)
            }),
        }
    }

    fn ensure_readable(&self, field: ArrayField, kind: ElementKind) -> Result<()> {
        if self.state == RecordState::Released {
            return Err(TriangleError::Lifecycle {
                operation: "read",
                state: self.state,
            });
        }
        if field.kind() != kind {
            return Err(TriangleError::validation(
                "field",
                format!("{} holds {:?} values", field, field.kind()),
            ));
        }
        Ok(())
    }

    /// Copy every present field into an owned `Triangulation`
    fn collect(&self) -> Result<Triangulation> {
        let regions = self
            .real_field(ArrayField::RegionList)?
            .chunks_exact(4)
            .map(Region::from_row)
            .collect();

        Ok(Triangulation {
            vertices: pairs(self.real_field(ArrayField::PointList)?),
            vertex_attributes: self.real_rows(ArrayField::PointAttributeList)?,
            vertex_markers: self.int_field(ArrayField::PointMarkerList)?.to_vec(),
            triangles: self.int_rows(ArrayField::TriangleList)?,
            triangle_attributes: self.real_rows(ArrayField::TriangleAttributeList)?,
            triangle_max_area: self.real_field(ArrayField::TriangleAreaList)?.to_vec(),
            neighbors: self
                .int_field(ArrayField::NeighborList)?
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect(),
            segments: pairs(self.int_field(ArrayField::SegmentList)?),
            segment_markers: self.int_field(ArrayField::SegmentMarkerList)?.to_vec(),
            holes: pairs(self.real_field(ArrayField::HoleList)?),
            regions,
            edges: pairs(self.int_field(ArrayField::EdgeList)?),
            edge_markers: self.int_field(ArrayField::EdgeMarkerList)?.to_vec(),
            normals: pairs(self.real_field(ArrayField::NormList)?),
        })
    }

    fn real_rows(&self, field: ArrayField) -> Result<Vec<Vec<f64>>> {
        let columns = field.raw_columns(&self.raw).max(0) as usize;
        let data = self.real_field(field)?;
        Ok(split_rows(data, columns))
    }

    fn int_rows(&self, field: ArrayField) -> Result<Vec<Vec<c_int>>> {
        let columns = field.raw_columns(&self.raw).max(0) as usize;
        let data = self.int_field(field)?;
        Ok(split_rows(data, columns))
    }
}

fn pairs<T: Copy>(data: &[T]) -> Vec<[T; 2]> {
    data.chunks_exact(2).map(|c| [c[0], c[1]]).collect()
}

fn split_rows<T: Copy>(data: &[T], columns: usize) -> Vec<Vec<T>> {
    if columns == 0 {
        return Vec::new();
    }
    data.chunks_exact(columns).map(<[T]>::to_vec).collect()
}
