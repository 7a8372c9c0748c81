use dialog_dot::{DChain, ResourceUri, narrow};

/// The most specific resource identifier `chain` authorizes for a request
/// on `uri`.
///
/// Every hop's pattern is intersected in turn with what remains of the
/// request. If any hop does not overlap, the chain authorizes nothing for
/// this request and `None` is returned; the chain is never partially used.
/// The result is never broader than `uri`.
pub fn compute_chain_resource_identifier(chain: &DChain, uri: &ResourceUri) -> Option<ResourceUri> {
    let mut suffix = uri.suffix().clone();

    for dot in chain.dots() {
        let pattern = dot.pattern()?;
        match narrow(pattern, &suffix) {
            Some(narrowed) => suffix = narrowed,
            None => {
                tracing::trace!(
                    chain = %chain.hash(),
                    dot = %dot.hash(),
                    %pattern,
                    %suffix,
                    "Chain hop does not overlap the request"
                );
                return None;
            }
        }
    }

    Some(uri.with_suffix(suffix))
}
