//! Macros for defining marked digest newtypes.

#[macro_export]
/// Make a new marked 32-byte digest type.
macro_rules! mark_32_byte_hash {
    (
        $(#[$outer:meta])*
        $hash_name:ident
    ) => {
        $(#[$outer])*
        #[derive(Hash, serde::Serialize, serde::Deserialize, Copy, Clone, Default, Debug, Eq, PartialEq, PartialOrd, Ord)]
        pub struct $hash_name(pub $crate::hash256::Hash256Digest);

        impl $hash_name {
            /// Deserialize from BE hex (block-explorer format)
            pub fn from_be_hex(be: &str) -> $crate::ser::SerResult<Self> {
                use $crate::marked::MarkedDigest;
                Ok(<Self as $crate::ser::ByteFormat>::deserialize_hex(be)?.reversed())
            }

            /// Convert to BE hex (block-explorer format)
            pub fn to_be_hex(&self) -> String {
                use $crate::marked::MarkedDigest;
                $crate::ser::ByteFormat::serialize_hex(&self.reversed())
            }
        }

        impl From<[u8; 32]> for $hash_name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8; 32]> for $hash_name {
            fn as_ref(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl $crate::ser::ByteFormat for $hash_name {
            type Error = $crate::ser::SerError;

            fn serialized_length(&self) -> usize {
                32
            }

            fn read_from<R>(reader: &mut R, _limit: usize) -> $crate::ser::SerResult<Self>
            where
                R: std::io::Read,
                Self: std::marker::Sized
            {
                let mut buf = $crate::hash256::Hash256Digest::default();
                reader.read_exact(buf.as_mut())?;
                Ok(Self(buf))
            }

            fn write_to<W>(&self, writer: &mut W) -> $crate::ser::SerResult<usize>
            where
                W: std::io::Write
            {
                Ok(writer.write(self.0.as_ref())?)
            }
        }

        impl $crate::marked::MarkedDigest for $hash_name {
            type Digest = $crate::hash256::Hash256Digest;

            fn new(hash: $crate::hash256::Hash256Digest) -> Self {
                Self(hash)
            }

            fn internal(&self) -> $crate::hash256::Hash256Digest {
                self.0
            }

            fn bytes(&self) -> Vec<u8> {
                self.0.to_vec()
            }
        }
    }
}
