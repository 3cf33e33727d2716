/// Face recognition: search reconciliation and enrollment
///
/// A search is sent to the vendor, the raw response is normalised into a
/// best candidate, the candidate's vendor UUID is resolved against local
/// personas/empleados, and an acceptance rule decides the outcome.
///
/// | Mode         | Default threshold | Identities          | Rule |
/// |--------------|-------------------|---------------------|------|
/// | `Residentes` | 0.50              | personas            | permissive (>= 0.9 always accepted) |
/// | `Global`     | 0.80              | personas, empleados | strict |

pub mod enrollment;
pub mod identity;
pub mod reconcile;

pub use enrollment::{auto_enroll_empleado, auto_enroll_persona, enroll, EnrollTarget, Enrollment, EnrollmentError};
pub use identity::{Identity, IdentityDirectory, InMemoryDirectory, PgIdentityDirectory};
pub use reconcile::{
    extract_candidates, normalize_similarity, reconcile, AcceptRule, RecognitionError, RecognitionMode,
    RecognitionOutcome,
};
