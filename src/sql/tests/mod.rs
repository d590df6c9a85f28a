mod utility;
