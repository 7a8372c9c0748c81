use dialog_dot::{Dot, Identity};

use crate::{CertificateSource, Classified};

/// The certificates issued by `issuer` that may extend a read-access chain.
///
/// A certificate qualifies when the source classifies it as valid, when it
/// is an access grant, and when that grant permits consuming. Certificates
/// the source attributes to `issuer` but that were issued by someone else
/// are dropped as well.
///
/// Only a failed lookup is an error; an empty result simply ends that branch
/// of the search.
pub async fn consumable_certificates<C>(source: &C, issuer: &Identity) -> Result<Vec<Dot>, C::Error>
where
    C: CertificateSource + ?Sized,
{
    let classified = source.certificates_from(issuer).await?;
    let total = classified.len();

    let eligible: Vec<Dot> = classified
        .into_iter()
        .filter_map(|Classified { dot, validity }| {
            if !validity.is_valid() {
                tracing::trace!(
                    dot = %dot.hash(),
                    ?validity,
                    "Skipping certificate that is not valid"
                );
                None
            } else if dot.issuer() != issuer {
                tracing::trace!(
                    dot = %dot.hash(),
                    %issuer,
                    "Skipping certificate from another issuer"
                );
                None
            } else if !dot.is_access() {
                tracing::trace!(dot = %dot.hash(), "Skipping non-access certificate");
                None
            } else if !dot.can_consume() {
                tracing::trace!(
                    dot = %dot.hash(),
                    "Skipping certificate without consume permission"
                );
                None
            } else {
                Some(dot)
            }
        })
        .collect();

    tracing::debug!(%issuer, total, eligible = eligible.len(), "Filtered certificates");
    Ok(eligible)
}
