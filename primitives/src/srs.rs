use ark_bn254::{Fr, G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ec::{AffineRepr, CurveGroup};
use crossbeam_channel::{bounded, Receiver, Sender};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};

use crate::{
    consts::{INSECURE_SRS_DOMAIN, SIZE_OF_G1_AFFINE_COMPRESSED, SIZE_OF_G2_AFFINE_COMPRESSED},
    errors::EncodingError,
    helpers,
    traits::{PointReadError, ReadPointFromBytes},
};

/// Where to find the SRS point files and how much of them to load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrsConfig {
    /// Big-endian compressed g1 points, `[τ^i]₁` for increasing `i`.
    pub g1_path: String,
    /// Big-endian compressed g2 points, `[τ^i]₂` for increasing `i`.
    pub g2_path: String,
    /// Optional file holding only the last `points_to_load` g2 points. When
    /// absent they are read from the tail of `g2_path`.
    #[serde(default)]
    pub g2_trailing_path: Option<String>,
    /// Total order of the SRS the files were generated for.
    pub order: u32,
    /// Number of points to load from each file.
    pub points_to_load: u32,
}

/// Represents the Structured Reference String (SRS) used in KZG commitments.
///
/// Points are stored in monomial form. The SRS is read-only once built and is
/// shared between concurrent encodings behind an `Arc`.
#[derive(Debug, PartialEq, Clone)]
pub struct SRS {
    /// `[τ^i]₁` for `i < points_to_load`.
    pub g1: Vec<G1Affine>,
    /// `[τ^i]₂` for `i < points_to_load`.
    pub g2: Vec<G2Affine>,
    /// `[τ^i]₂` for `order - points_to_load <= i < order`, used by length proofs.
    pub g2_trailing: Vec<G2Affine>,
    /// The order of the SRS.
    pub order: u32,
}

impl SRS {
    /// Loads the SRS from the point files described by `config`.
    pub fn new(config: &SrsConfig) -> Result<Self, EncodingError> {
        if config.points_to_load > config.order {
            return Err(EncodingError::GenericError(
                "Number of points to load exceeds SRS order.".to_string(),
            ));
        }

        let g1 = Self::parallel_read_points::<G1Affine>(
            config.g1_path.clone(),
            SIZE_OF_G1_AFFINE_COMPRESSED,
            0,
            config.points_to_load,
        )?;
        let g2 = Self::parallel_read_points::<G2Affine>(
            config.g2_path.clone(),
            SIZE_OF_G2_AFFINE_COMPRESSED,
            0,
            config.points_to_load,
        )?;
        let g2_trailing = match &config.g2_trailing_path {
            Some(path) => Self::parallel_read_points::<G2Affine>(
                path.clone(),
                SIZE_OF_G2_AFFINE_COMPRESSED,
                0,
                config.points_to_load,
            )?,
            None => Self::parallel_read_points::<G2Affine>(
                config.g2_path.clone(),
                SIZE_OF_G2_AFFINE_COMPRESSED,
                (config.order - config.points_to_load) as u64,
                config.points_to_load,
            )?,
        };

        Ok(Self {
            g1,
            g2,
            g2_trailing,
            order: config.order,
        })
    }

    /// Builds an SRS from a secret derived from `seed`. Anyone knowing the seed
    /// can forge proofs, so this is only meant for tests and local networks.
    pub fn insecure_setup(seed: &[u8], order: u32, points_to_load: u32) -> Result<Self, EncodingError> {
        if points_to_load > order {
            return Err(EncodingError::GenericError(
                "Number of points to load exceeds SRS order.".to_string(),
            ));
        }
        let tau: Fr = helpers::hash_to_field_element(&[INSECURE_SRS_DOMAIN, seed].concat());
        let powers = helpers::compute_powers(&tau, order as usize);
        let head = &powers[..points_to_load as usize];
        let tail = &powers[(order - points_to_load) as usize..];

        let g1: Vec<G1Projective> = head.par_iter().map(|p| G1Affine::generator() * p).collect();
        let g2: Vec<G2Projective> = head.par_iter().map(|p| G2Affine::generator() * p).collect();
        let g2_trailing: Vec<G2Projective> =
            tail.par_iter().map(|p| G2Affine::generator() * p).collect();

        Ok(Self {
            g1: G1Projective::normalize_batch(&g1),
            g2: G2Projective::normalize_batch(&g2),
            g2_trailing: G2Projective::normalize_batch(&g2_trailing),
            order,
        })
    }

    /// Returns `[τ^power]₂` from either the head or the trailing points.
    pub fn g2_power(&self, power: usize) -> Option<G2Affine> {
        if power < self.g2.len() {
            return Some(self.g2[power]);
        }
        let trailing_start = (self.order as usize).checked_sub(self.g2_trailing.len())?;
        if power >= trailing_start {
            return self.g2_trailing.get(power - trailing_start).copied();
        }
        None
    }

    fn process_chunks<T>(
        receiver: Receiver<(Vec<u8>, usize)>,
    ) -> Result<Vec<(T, usize)>, PointReadError>
    where
        T: ReadPointFromBytes,
    {
        receiver
            .iter()
            .map(|(chunk, position)| T::read_point_from_bytes_be(&chunk).map(|p| (p, position)))
            .collect()
    }

    /// Reads points in parallel from a file, by creating one reader thread,
    /// which reads bytes from the file, and fans them out to worker threads
    /// (one per cpu) which parse the bytes into points. The points are sorted
    /// back by their original position in the file.
    fn parallel_read_points<T>(
        file_path: String,
        point_size: usize,
        skip_points: u64,
        points_to_load: u32,
    ) -> Result<Vec<T>, EncodingError>
    where
        T: ReadPointFromBytes + Send + 'static,
    {
        let (sender, receiver) = bounded::<(Vec<u8>, usize)>(1000);

        let reader_handle = std::thread::spawn(move || -> io::Result<()> {
            Self::read_file_chunks(&file_path, sender, point_size, skip_points, points_to_load)
        });

        let num_workers = num_cpus::get();
        let workers: Vec<_> = (0..num_workers)
            .map(|_| {
                let receiver = receiver.clone();
                std::thread::spawn(move || Self::process_chunks::<T>(receiver))
            })
            .collect();
        drop(receiver);

        match reader_handle.join() {
            Ok(Ok(())) => {},
            Ok(Err(e)) => return Err(EncodingError::GenericError(e.to_string())),
            Err(_) => {
                return Err(EncodingError::GenericError(
                    "Reader thread panicked.".to_string(),
                ))
            },
        }

        let mut all_points = Vec::with_capacity(points_to_load as usize);
        for worker in workers {
            let points = worker
                .join()
                .map_err(|_| EncodingError::GenericError("Worker thread panicked.".to_string()))?
                .map_err(|e| EncodingError::SerializationError(e.to_string()))?;
            all_points.extend(points);
        }

        // Sort by original position to maintain order
        all_points.sort_by_key(|&(_, position)| position);

        if all_points.len() != points_to_load as usize {
            return Err(EncodingError::GenericError(format!(
                "Expected {} points, but got {}.",
                points_to_load,
                all_points.len()
            )));
        }

        Ok(all_points.into_iter().map(|(point, _)| point).collect())
    }

    /// Reads `num_points` points of `point_size` bytes, starting `skip_points`
    /// points into the file, and sends them through a channel.
    fn read_file_chunks(
        file_path: &str,
        sender: Sender<(Vec<u8>, usize)>,
        point_size: usize,
        skip_points: u64,
        num_points: u32,
    ) -> io::Result<()> {
        let file = File::open(file_path)?;
        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(skip_points * point_size as u64))?;

        for position in 0..num_points as usize {
            let mut buffer = vec![0u8; point_size];
            match reader.read_exact(&mut buffer) {
                Ok(()) => {},
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            }
            if sender.send((buffer, position)).is_err() {
                break;
            }
        }
        Ok(())
    }
}
