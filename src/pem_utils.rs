use crate::error::Error;

/// Convert DER-encoded data into a PEM-encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(&pem, pem::EncodeConfig::new())
}

/// Convert a PEM-encoded string to DER-encoded bytes.
pub fn pem_to_der(pem_str: &str) -> Result<Vec<u8>, Error> {
    let pem = pem::parse(pem_str).map_err(|source| Error::PemDecode { source })?;
    Ok(pem.contents().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pem_round_trip() {
        let der = vec![0x30, 0x03, 0x02, 0x01, 0x05];
        let pem_str = der_to_pem(&der, "CERTIFICATE");
        assert!(pem_str.starts_with("-----BEGIN CERTIFICATE-----"));
        assert_eq!(pem_to_der(&pem_str).unwrap(), der);
    }

    #[test]
    fn rejects_non_pem_input() {
        assert!(matches!(
            pem_to_der("not pem at all"),
            Err(Error::PemDecode { .. })
        ));
    }
}
