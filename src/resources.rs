use std::io::{self, Read};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Represents a single rom with it's information
///
/// A rom is a flat binary image, there is no header or checksum,
/// the data is copied as is to the program start.
pub struct Rom {
    /// The rom name
    name: String,
    /// The content data of the rom
    /// stored as a u8 slice on the heap
    data: Box<[u8]>,
}

impl Rom {
    /// Will generate a new rom based of the given data
    pub fn new(name: &str, data: impl Into<Box<[u8]>>) -> Self {
        Rom {
            name: name.to_string(),
            data: data.into(),
        }
    }

    /// Will read the whole source into a rom
    pub fn from_reader<R: Read>(name: &str, mut reader: R) -> io::Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Rom::new(name, data))
    }

    /// Will return a slice internal values of the given data
    pub fn get_data(&self) -> &[u8] {
        &self.data
    }

    /// Will return the name of the rom.
    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
