mod timestamping;
